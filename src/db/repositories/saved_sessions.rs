use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{connection::Database, helpers::parse_datetime, models::SavedSession};

fn row_to_saved_session(row: &Row) -> Result<SavedSession> {
    let created_at: String = row.get("created_at")?;

    Ok(SavedSession {
        id: row.get("id")?,
        name: row.get("name")?,
        duration_text: row.get("duration_text")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Store a named duration text. Callers validate the text first; the
    /// store only enforces a unique, non-empty name.
    pub async fn insert_saved_session(&self, name: String, duration_text: String) -> Result<SavedSession> {
        self.execute(move |conn| {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("Session name cannot be empty");
            }

            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM saved_sessions WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                bail!("A session named '{name}' already exists");
            }

            let now = Utc::now();
            conn.execute(
                "INSERT INTO saved_sessions (name, duration_text, created_at)
                 VALUES (?1, ?2, ?3)",
                params![name, duration_text, now.to_rfc3339()],
            )?;

            Ok(SavedSession {
                id: conn.last_insert_rowid(),
                name,
                duration_text,
                created_at: now,
            })
        })
        .await
    }

    pub async fn list_saved_sessions(&self) -> Result<Vec<SavedSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, duration_text, created_at
                 FROM saved_sessions
                 ORDER BY name COLLATE NOCASE ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_saved_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn get_saved_session(&self, session_id: i64) -> Result<SavedSession> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, duration_text, created_at
                 FROM saved_sessions
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => row_to_saved_session(row),
                None => Err(anyhow!("Saved session not found")),
            }
        })
        .await
    }

    pub async fn delete_saved_session(&self, session_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM saved_sessions WHERE id = ?1",
                params![session_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Saved session not found"));
            }

            Ok(())
        })
        .await
    }
}
