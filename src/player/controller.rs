use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

use crate::{
    db::{Database, PracticeRun, RunStatus},
    schedule::SessionDurationSpec,
};

use super::{PlayerOptions, PlayerSnapshot, PlayerStatus, SessionPlayer, TickOutcome};

const EVENT_CAPACITY: usize = 64;

/// Published on every state change and every counted second.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "snapshot", rename_all = "camelCase")]
pub enum PlayerEvent {
    StateChanged(PlayerSnapshot),
    Tick(PlayerSnapshot),
    Ended(PlayerSnapshot),
}

impl PlayerEvent {
    pub fn snapshot(&self) -> &PlayerSnapshot {
        match self {
            PlayerEvent::StateChanged(snapshot)
            | PlayerEvent::Tick(snapshot)
            | PlayerEvent::Ended(snapshot) => snapshot,
        }
    }
}

struct ActiveRun {
    run_id: String,
    player: SessionPlayer,
}

#[derive(Clone)]
pub struct PlayerController {
    active: Arc<Mutex<Option<ActiveRun>>>,
    db: Database,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
    cue_threshold_secs: Arc<AtomicU32>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerController {
    pub fn new(db: Database, cue_threshold_secs: u32) -> Self {
        let debug_mode = std::env::var("SKETCHTIMER_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            active: Arc::new(Mutex::new(None)),
            db,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
            cue_threshold_secs: Arc::new(AtomicU32::new(cue_threshold_secs)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Takes effect for the next player that begins. Zero disables the cue.
    pub fn set_cue_threshold(&self, secs: u32) {
        self.cue_threshold_secs.store(secs, Ordering::Relaxed);
    }

    pub async fn begin_session(
        &self,
        images: Vec<String>,
        duration_text: &str,
        shuffle: bool,
        source: String,
    ) -> Result<PlayerSnapshot> {
        let spec: SessionDurationSpec = duration_text.parse()?;
        let player = SessionPlayer::new(images, spec, self.options(shuffle))?;
        self.begin(player, source).await
    }

    pub async fn begin_fixed(
        &self,
        images: Vec<String>,
        interval_secs: u32,
        shuffle: bool,
        source: String,
    ) -> Result<PlayerSnapshot> {
        let player = SessionPlayer::fixed_interval(images, interval_secs, self.options(shuffle))?;
        self.begin(player, source).await
    }

    pub async fn snapshot(&self) -> Option<PlayerSnapshot> {
        let guard = self.active.lock().await;
        guard.as_ref().map(|run| run.player.snapshot())
    }

    pub async fn start(&self) -> Result<PlayerSnapshot> {
        let (changed, snapshot) = self.apply(|player| player.start()).await?;
        if changed {
            self.spawn_ticker().await;
            self.emit(PlayerEvent::StateChanged(snapshot.clone()));
        }
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<PlayerSnapshot> {
        let (changed, snapshot) = self.apply(|player| player.pause()).await?;
        if changed {
            self.cancel_ticker().await;
            self.persist_progress().await;
            self.emit(PlayerEvent::StateChanged(snapshot.clone()));
        }
        Ok(snapshot)
    }

    pub async fn skip_forward(&self) -> Result<PlayerSnapshot> {
        self.apply_and_emit(|player| player.skip_forward()).await
    }

    pub async fn skip_backward(&self) -> Result<PlayerSnapshot> {
        self.apply_and_emit(|player| player.skip_backward()).await
    }

    pub async fn reset_timer(&self) -> Result<PlayerSnapshot> {
        self.apply_and_emit(|player| player.reset_current_timer()).await
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<PlayerSnapshot> {
        self.apply_and_emit(|player| player.set_shuffle(enabled)).await
    }

    /// Ends the active player and closes its history row. Ending twice is
    /// a no-op that returns the final snapshot again.
    pub async fn end(&self) -> Result<PlayerSnapshot> {
        let stopped_at = Utc::now();
        let (run_id, changed, snapshot) = {
            let mut guard = self.active.lock().await;
            let run = guard
                .as_mut()
                .ok_or_else(|| anyhow!("no active session to end"))?;
            let changed = run.player.end();
            (run.run_id.clone(), changed, run.player.snapshot())
        };

        if !changed {
            return Ok(snapshot);
        }

        self.cancel_ticker().await;

        self.db
            .mark_practice_run_status(
                &run_id,
                RunStatus::Completed,
                snapshot.elapsed_secs,
                snapshot.images_shown,
                stopped_at,
            )
            .await?;

        info!(
            "Practice run {run_id} ended after {}s, {} images",
            snapshot.elapsed_secs, snapshot.images_shown
        );
        self.emit(PlayerEvent::Ended(snapshot.clone()));
        Ok(snapshot)
    }

    async fn begin(&self, player: SessionPlayer, source: String) -> Result<PlayerSnapshot> {
        let unfinished = {
            let guard = self.active.lock().await;
            guard.as_ref().is_some_and(|run| !run.player.is_ended())
        };
        if unfinished {
            self.end().await?;
        }

        let started_at = Utc::now();
        let run = PracticeRun {
            id: Uuid::new_v4().to_string(),
            mode: player.mode(),
            duration_text: player.spec().to_string(),
            source,
            status: RunStatus::Running,
            started_at,
            stopped_at: None,
            active_secs: 0,
            images_shown: player.images_shown(),
            updated_at: started_at,
        };
        self.db.insert_practice_run(&run).await?;

        info!(
            "Practice run {} begun: {} over {} images",
            run.id,
            run.duration_text,
            player.images().len()
        );

        let snapshot = player.snapshot();
        {
            let mut guard = self.active.lock().await;
            *guard = Some(ActiveRun {
                run_id: run.id,
                player,
            });
        }

        self.emit(PlayerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    fn options(&self, shuffle: bool) -> PlayerOptions {
        PlayerOptions {
            shuffle,
            cue_threshold_secs: self.cue_threshold_secs.load(Ordering::Relaxed),
            seed: None,
        }
    }

    async fn apply<F>(&self, action: F) -> Result<(bool, PlayerSnapshot)>
    where
        F: FnOnce(&mut SessionPlayer) -> bool,
    {
        let mut guard = self.active.lock().await;
        let run = guard
            .as_mut()
            .ok_or_else(|| anyhow!("no active session"))?;
        let changed = action(&mut run.player);
        Ok((changed, run.player.snapshot()))
    }

    async fn apply_and_emit<F>(&self, action: F) -> Result<PlayerSnapshot>
    where
        F: FnOnce(&mut SessionPlayer) -> bool,
    {
        let (changed, snapshot) = self.apply(action).await?;
        if changed {
            self.emit(PlayerEvent::StateChanged(snapshot.clone()));
        }
        Ok(snapshot)
    }

    async fn persist_progress(&self) {
        let progress = {
            let guard = self.active.lock().await;
            guard.as_ref().map(|run| {
                (
                    run.run_id.clone(),
                    run.player.elapsed_secs(),
                    run.player.images_shown(),
                )
            })
        };

        if let Some((run_id, active_secs, images_shown)) = progress {
            if let Err(err) = self
                .db
                .update_practice_progress(&run_id, active_secs, images_shown, Utc::now())
                .await
            {
                error!("Failed to persist progress for run {run_id}: {err}");
            }
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let active = self.active.clone();
        let db = self.db.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;
        let heartbeat_every = self.heartbeat_every_ticks.max(1);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            let mut ticks: u32 = 0;
            loop {
                interval.tick().await;

                let (run_id, outcome, snapshot) = {
                    let mut guard = active.lock().await;
                    let Some(run) = guard.as_mut() else {
                        break;
                    };
                    if run.player.status() != PlayerStatus::Running {
                        break;
                    }
                    let outcome = run.player.tick();
                    (run.run_id.clone(), outcome, run.player.snapshot())
                };

                let _ = events.send(PlayerEvent::Tick(snapshot.clone()));
                if outcome == TickOutcome::Advanced {
                    let _ = events.send(PlayerEvent::StateChanged(snapshot.clone()));
                }

                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    let db_clone = db.clone();
                    tokio::spawn(async move {
                        if let Err(err) = db_clone
                            .update_practice_progress(
                                &run_id,
                                snapshot.elapsed_secs,
                                snapshot.images_shown,
                                Utc::now(),
                            )
                            .await
                        {
                            error!("Failed to persist progress for run {run_id}: {err}");
                        }
                    });
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
