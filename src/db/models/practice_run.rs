use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::PlayerMode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::Interrupted => "Interrupted",
        }
    }
}

/// History row for one player run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRun {
    pub id: String,
    pub mode: PlayerMode,
    pub duration_text: String,
    pub source: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub active_secs: u64,
    pub images_shown: u64,
    pub updated_at: DateTime<Utc>,
}
