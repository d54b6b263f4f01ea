pub mod cli;
pub mod db;
pub mod library;
pub mod player;
pub mod schedule;
pub mod settings;
pub mod utils;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{info, warn};

use db::Database;
use player::PlayerController;
use settings::SettingsStore;

pub const DATA_DIR_ENV: &str = "SKETCHTIMER_DATA_DIR";
pub const DATABASE_FILE: &str = "sketchtimer.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

pub struct AppState {
    pub db: Database,
    pub player: PlayerController,
    pub settings: SettingsStore,
}

impl AppState {
    /// Open the library under `data_dir`, creating it on first use.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let database = Database::new(data_dir.join(DATABASE_FILE))?;
        recover_unfinished_runs(&database).await?;

        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        let player = PlayerController::new(database.clone(), settings.cue().effective_threshold());

        Ok(Self {
            db: database,
            player,
            settings,
        })
    }
}

// Runs still marked Running were cut off by a crash or a killed terminal.
async fn recover_unfinished_runs(db: &Database) -> Result<usize> {
    let runs = db.get_unfinished_practice_runs().await?;
    let now = Utc::now();
    for run in &runs {
        warn!(
            "Recovered unfinished practice run {}; marking as Interrupted",
            run.id
        );
        db.mark_practice_run_interrupted(&run.id, now).await?;
    }
    Ok(runs.len())
}

/// `--data-dir`, then `SKETCHTIMER_DATA_DIR`, then the platform data dir.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("sketchtimer"))
        .ok_or_else(|| anyhow!("no data directory available; pass --data-dir or set {DATA_DIR_ENV}"))
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = cli::Cli::parse();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
        .and_then(|runtime| {
            runtime.block_on(async move {
                let data_dir = resolve_data_dir(args.data_dir.clone())?;
                let state = AppState::open(&data_dir).await?;
                info!("Using library at {}", data_dir.display());
                cli::execute(&state, args.command).await
            })
        });

    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PracticeRun, RunStatus};
    use crate::player::PlayerMode;
    use tempfile::tempdir;

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/sketch-flag"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/sketch-flag"));
    }

    #[tokio::test]
    async fn open_marks_running_rows_interrupted() {
        let dir = tempdir().unwrap();

        {
            let state = AppState::open(dir.path()).await.unwrap();
            let now = Utc::now();
            state
                .db
                .insert_practice_run(&PracticeRun {
                    id: "crashed".into(),
                    mode: PlayerMode::Fixed,
                    duration_text: "3x30sec".into(),
                    source: "All images".into(),
                    status: RunStatus::Running,
                    started_at: now,
                    stopped_at: None,
                    active_secs: 12,
                    images_shown: 1,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        let state = AppState::open(dir.path()).await.unwrap();
        let run = state.db.get_practice_run("crashed").await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Interrupted);
        assert!(run.stopped_at.is_some());
        assert_eq!(run.active_secs, 12);
    }
}
