use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::RunStatus;
use crate::player::PlayerMode;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_run_status(value: &str) -> Result<RunStatus> {
    match value {
        "Running" => Ok(RunStatus::Running),
        "Completed" => Ok(RunStatus::Completed),
        "Interrupted" => Ok(RunStatus::Interrupted),
        other => Err(anyhow!("unknown practice run status {other}")),
    }
}

pub fn parse_mode(value: &str) -> Result<PlayerMode> {
    match value {
        "Fixed" => Ok(PlayerMode::Fixed),
        "Session" => Ok(PlayerMode::Session),
        other => Err(anyhow!("unknown player mode {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversions_reject_out_of_range_values() {
        assert_eq!(to_i64(42).unwrap(), 42);
        assert!(to_i64(u64::MAX).is_err());
        assert_eq!(to_u64(7, "active_secs").unwrap(), 7);
        assert!(to_u64(-1, "active_secs").is_err());
    }

    #[test]
    fn datetimes_round_trip_through_rfc3339() {
        let now = Utc::now();
        let parsed = parse_datetime(&now.to_rfc3339(), "started_at").unwrap();
        assert_eq!(parsed, now);
        assert_eq!(parse_optional_datetime(None, "stopped_at").unwrap(), None);
        assert!(parse_datetime("yesterday", "started_at").is_err());
    }

    #[test]
    fn status_and_mode_strings_match_their_enums() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Interrupted] {
            assert_eq!(parse_run_status(status.as_str()).unwrap(), status);
        }
        for mode in [PlayerMode::Fixed, PlayerMode::Session] {
            assert_eq!(parse_mode(mode.as_str()).unwrap(), mode);
        }
        assert!(parse_run_status("Cancelled").is_err());
    }
}
