use crate::{
    db::{CollectionSelector, PracticeRun},
    player::{PlayerController, PlayerSnapshot},
    settings::CueSettings,
    AppState,
};

fn controller_from_state(state: &AppState) -> PlayerController {
    state.player.clone()
}

async fn images_for(state: &AppState, selector: CollectionSelector) -> Result<Vec<String>, String> {
    state
        .db
        .image_paths(selector)
        .await
        .map_err(|e| e.to_string())
}

async fn source_label(state: &AppState, selector: CollectionSelector) -> Result<String, String> {
    match selector {
        CollectionSelector::All => Ok("All images".to_string()),
        CollectionSelector::Collection(id) => state
            .db
            .get_collection(id)
            .await
            .map(|collection| collection.name)
            .map_err(|e| e.to_string()),
    }
}

/// Begin a player from duration text, e.g. `"2x30sec + 1x5min break"`.
pub async fn begin_session(
    state: &AppState,
    duration_text: String,
    selector: CollectionSelector,
    shuffle: bool,
) -> Result<PlayerSnapshot, String> {
    let images = images_for(state, selector).await?;
    let source = source_label(state, selector).await?;
    let snapshot = controller_from_state(state)
        .begin_session(images, &duration_text, shuffle, source)
        .await
        .map_err(|e| e.to_string())?;

    state
        .settings
        .update_last_used(|last| {
            last.collection = selector;
            last.shuffle = shuffle;
        })
        .map_err(|e| e.to_string())?;

    Ok(snapshot)
}

pub async fn begin_saved_session(
    state: &AppState,
    session_id: i64,
    selector: CollectionSelector,
    shuffle: bool,
) -> Result<PlayerSnapshot, String> {
    let saved = state
        .db
        .get_saved_session(session_id)
        .await
        .map_err(|e| e.to_string())?;

    let snapshot = begin_session(state, saved.duration_text, selector, shuffle).await?;

    state
        .settings
        .update_last_used(|last| last.session_id = Some(session_id))
        .map_err(|e| e.to_string())?;

    Ok(snapshot)
}

/// Fixed-interval mode; falls back to the last interval used.
pub async fn begin_fixed(
    state: &AppState,
    interval_secs: Option<u32>,
    selector: CollectionSelector,
    shuffle: bool,
) -> Result<PlayerSnapshot, String> {
    let interval_secs =
        interval_secs.unwrap_or_else(|| state.settings.last_used().fixed_interval_secs);
    let images = images_for(state, selector).await?;
    let source = source_label(state, selector).await?;
    let snapshot = controller_from_state(state)
        .begin_fixed(images, interval_secs, shuffle, source)
        .await
        .map_err(|e| e.to_string())?;

    state
        .settings
        .update_last_used(|last| {
            last.collection = selector;
            last.shuffle = shuffle;
            last.fixed_interval_secs = interval_secs;
        })
        .map_err(|e| e.to_string())?;

    Ok(snapshot)
}

pub async fn get_player_state(state: &AppState) -> Result<Option<PlayerSnapshot>, String> {
    Ok(controller_from_state(state).snapshot().await)
}

pub async fn start_player(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .start()
        .await
        .map_err(|e| e.to_string())
}

pub async fn pause_player(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .pause()
        .await
        .map_err(|e| e.to_string())
}

pub async fn skip_forward(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .skip_forward()
        .await
        .map_err(|e| e.to_string())
}

pub async fn skip_backward(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .skip_backward()
        .await
        .map_err(|e| e.to_string())
}

pub async fn reset_timer(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .reset_timer()
        .await
        .map_err(|e| e.to_string())
}

pub async fn set_shuffle(state: &AppState, enabled: bool) -> Result<PlayerSnapshot, String> {
    let snapshot = controller_from_state(state)
        .set_shuffle(enabled)
        .await
        .map_err(|e| e.to_string())?;

    state
        .settings
        .update_last_used(|last| last.shuffle = enabled)
        .map_err(|e| e.to_string())?;

    Ok(snapshot)
}

pub async fn end_player(state: &AppState) -> Result<PlayerSnapshot, String> {
    controller_from_state(state)
        .end()
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_history(
    state: &AppState,
    limit: usize,
    offset: usize,
) -> Result<Vec<PracticeRun>, String> {
    state
        .db
        .list_practice_runs(limit, offset)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_cue_settings(state: &AppState) -> Result<CueSettings, String> {
    Ok(state.settings.cue())
}

pub async fn update_cue_settings(state: &AppState, settings: CueSettings) -> Result<(), String> {
    state
        .settings
        .update_cue(settings.clone())
        .map_err(|e| e.to_string())?;
    state.player.set_cue_threshold(settings.effective_threshold());
    Ok(())
}
