use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{parse, ScheduleError, SessionDurationSpec};

/// A named duration text, e.g. `Warmup` / `2x30sec + 1x5min break`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub id: i64,
    pub name: String,
    pub duration_text: String,
    pub created_at: DateTime<Utc>,
}

impl SavedSession {
    /// `"<name>: <duration text>"`; the parser strips the name again.
    pub fn display_label(&self) -> String {
        format!("{}: {}", self.name, self.duration_text)
    }

    pub fn spec(&self) -> Result<SessionDurationSpec, ScheduleError> {
        parse(&self.duration_text)
    }
}
