use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: i64,
    pub path: String,
    pub added_at: DateTime<Utc>,
}

/// Outcome of an import: what was stored, what was already there, and
/// what was not recognised as an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: Vec<ImageRecord>,
    pub duplicates: Vec<String>,
    pub skipped: Vec<String>,
}
