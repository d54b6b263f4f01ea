use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_mode, parse_optional_datetime, parse_run_status, to_i64, to_u64},
    models::{PracticeRun, RunStatus},
};

fn row_to_practice_run(row: &Row) -> Result<PracticeRun> {
    let mode: String = row.get("mode")?;
    let status: String = row.get("status")?;
    let started_at: String = row.get("started_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;
    let updated_at: String = row.get("updated_at")?;
    let active_secs: i64 = row.get("active_secs")?;
    let images_shown: i64 = row.get("images_shown")?;

    Ok(PracticeRun {
        id: row.get("id")?,
        mode: parse_mode(&mode)?,
        duration_text: row.get("duration_text")?,
        source: row.get("source")?,
        status: parse_run_status(&status)?,
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        active_secs: to_u64(active_secs, "active_secs")?,
        images_shown: to_u64(images_shown, "images_shown")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const RUN_COLUMNS: &str = "id, mode, duration_text, source, status, started_at, stopped_at, active_secs, images_shown, updated_at";

impl Database {
    pub async fn insert_practice_run(&self, run: &PracticeRun) -> Result<()> {
        let record = run.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO practice_runs (id, mode, duration_text, source, status, started_at, stopped_at, active_secs, images_shown, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.mode.as_str(),
                    record.duration_text,
                    record.source,
                    record.status.as_str(),
                    record.started_at.to_rfc3339(),
                    record.stopped_at.as_ref().map(|dt| dt.to_rfc3339()),
                    to_i64(record.active_secs)?,
                    to_i64(record.images_shown)?,
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn update_practice_progress(
        &self,
        run_id: &str,
        active_secs: u64,
        images_shown: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE practice_runs
                 SET active_secs = ?1,
                     images_shown = ?2,
                     updated_at = ?3
                 WHERE id = ?4",
                params![
                    to_i64(active_secs)?,
                    to_i64(images_shown)?,
                    updated_at.to_rfc3339(),
                    run_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn mark_practice_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        active_secs: u64,
        images_shown: u64,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE practice_runs
                 SET status = ?1,
                     active_secs = ?2,
                     images_shown = ?3,
                     stopped_at = ?4,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    status.as_str(),
                    to_i64(active_secs)?,
                    to_i64(images_shown)?,
                    stopped_at.to_rfc3339(),
                    run_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_practice_run(&self, run_id: &str) -> Result<Option<PracticeRun>> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS} FROM practice_runs WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![run_id])?;
            let run = match rows.next()? {
                Some(row) => Some(row_to_practice_run(row)?),
                None => None,
            };
            Ok(run)
        })
        .await
    }

    pub async fn list_practice_runs(&self, limit: usize, offset: usize) -> Result<Vec<PracticeRun>> {
        let limit = limit as i64;
        let offset = offset as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS}
                 FROM practice_runs
                 ORDER BY started_at DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;

            let mut rows = stmt.query(params![limit, offset])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_practice_run(row)?);
            }

            Ok(runs)
        })
        .await
    }

    /// Runs still marked Running when the process last stopped.
    pub async fn get_unfinished_practice_runs(&self) -> Result<Vec<PracticeRun>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS}
                 FROM practice_runs
                 WHERE status = 'Running'
                 ORDER BY started_at DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_practice_run(row)?);
            }
            Ok(runs)
        })
        .await
    }

    pub async fn mark_practice_run_interrupted(
        &self,
        run_id: &str,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE practice_runs
                 SET status = ?1,
                     stopped_at = ?2,
                     updated_at = ?2
                 WHERE id = ?3",
                params![RunStatus::Interrupted.as_str(), stopped_at.to_rfc3339(), run_id],
            )?;
            Ok(())
        })
        .await
    }
}
