use std::path::PathBuf;

use crate::{
    db::{Collection, ImageRecord, ImportReport, SavedSession},
    library::import,
    schedule::{self, SegmentDraft},
    AppState,
};

pub async fn import_images(state: &AppState, paths: Vec<PathBuf>) -> Result<ImportReport, String> {
    import::import_images(&state.db, paths)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_images(state: &AppState) -> Result<Vec<ImageRecord>, String> {
    state.db.list_images().await.map_err(|e| e.to_string())
}

pub async fn remove_image(state: &AppState, image_id: i64) -> Result<(), String> {
    state
        .db
        .delete_image(image_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn create_collection(state: &AppState, name: String) -> Result<Collection, String> {
    state
        .db
        .create_collection(name)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_collections(state: &AppState) -> Result<Vec<Collection>, String> {
    state.db.list_collections().await.map_err(|e| e.to_string())
}

pub async fn rename_collection(
    state: &AppState,
    collection_id: i64,
    name: String,
) -> Result<Collection, String> {
    state
        .db
        .rename_collection(collection_id, name)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_collection(state: &AppState, collection_id: i64) -> Result<(), String> {
    state
        .db
        .delete_collection(collection_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn add_to_collection(
    state: &AppState,
    collection_id: i64,
    image_ids: Vec<i64>,
) -> Result<usize, String> {
    state
        .db
        .add_images_to_collection(collection_id, image_ids)
        .await
        .map_err(|e| e.to_string())
}

pub async fn remove_from_collection(
    state: &AppState,
    collection_id: i64,
    image_id: i64,
) -> Result<(), String> {
    state
        .db
        .remove_image_from_collection(collection_id, image_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn reorder_collection(
    state: &AppState,
    collection_id: i64,
    image_ids: Vec<i64>,
) -> Result<(), String> {
    state
        .db
        .reorder_collection(collection_id, image_ids)
        .await
        .map_err(|e| e.to_string())
}

pub async fn collection_images(
    state: &AppState,
    collection_id: i64,
) -> Result<Vec<ImageRecord>, String> {
    state
        .db
        .collection_images(collection_id)
        .await
        .map_err(|e| e.to_string())
}

/// Parse first so only well-formed, normalised text is stored.
pub async fn save_session(
    state: &AppState,
    name: String,
    duration_text: String,
) -> Result<SavedSession, String> {
    let spec = schedule::parse(&duration_text).map_err(|e| e.to_string())?;
    state
        .db
        .insert_saved_session(name, schedule::serialize(&spec))
        .await
        .map_err(|e| e.to_string())
}

pub async fn save_session_from_segments(
    state: &AppState,
    name: String,
    drafts: Vec<SegmentDraft>,
) -> Result<SavedSession, String> {
    let spec = schedule::build(&drafts).map_err(|e| e.to_string())?;
    state
        .db
        .insert_saved_session(name, schedule::serialize(&spec))
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_saved_sessions(state: &AppState) -> Result<Vec<SavedSession>, String> {
    state
        .db
        .list_saved_sessions()
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_saved_session(state: &AppState, session_id: i64) -> Result<SavedSession, String> {
    state
        .db
        .get_saved_session(session_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_saved_session(state: &AppState, session_id: i64) -> Result<(), String> {
    state
        .db
        .delete_saved_session(session_id)
        .await
        .map_err(|e| e.to_string())
}

/// Normalised form of `duration_text`, or the parse error.
pub fn check_duration_text(duration_text: &str) -> Result<String, String> {
    schedule::parse(duration_text)
        .map(|spec| schedule::serialize(&spec))
        .map_err(|e| e.to_string())
}
