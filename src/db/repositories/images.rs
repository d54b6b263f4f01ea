use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::{CollectionSelector, ImageRecord},
};

fn row_to_image(row: &Row) -> Result<ImageRecord> {
    let added_at: String = row.get("added_at")?;

    Ok(ImageRecord {
        id: row.get("id")?,
        path: row.get("path")?,
        added_at: parse_datetime(&added_at, "added_at")?,
    })
}

impl Database {
    /// Insert image paths, skipping ones already in the library.
    /// Returns the new records and the paths that were already present.
    pub async fn insert_images(&self, paths: Vec<String>) -> Result<(Vec<ImageRecord>, Vec<String>)> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();
            let mut imported = Vec::new();
            let mut duplicates = Vec::new();

            {
                let mut insert = tx.prepare(
                    "INSERT OR IGNORE INTO images (path, added_at) VALUES (?1, ?2)",
                )?;
                for path in paths {
                    let inserted = insert.execute(params![path, now.to_rfc3339()])?;
                    if inserted == 0 {
                        duplicates.push(path);
                    } else {
                        imported.push(ImageRecord {
                            id: tx.last_insert_rowid(),
                            path,
                            added_at: now,
                        });
                    }
                }
            }

            tx.commit()?;
            Ok((imported, duplicates))
        })
        .await
    }

    pub async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, path, added_at
                 FROM images
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut images = Vec::new();
            while let Some(row) = rows.next()? {
                images.push(row_to_image(row)?);
            }

            Ok(images)
        })
        .await
    }

    pub async fn delete_image(&self, image_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM images WHERE id = ?1", params![image_id])?;

            if rows_affected == 0 {
                return Err(anyhow!("Image not found"));
            }

            Ok(())
        })
        .await
    }

    /// Ordered image paths for a player: every image in import order, or
    /// a collection's members in their stored order.
    pub async fn image_paths(&self, selector: CollectionSelector) -> Result<Vec<String>> {
        self.execute(move |conn| {
            let mut paths = Vec::new();
            match selector {
                CollectionSelector::All => {
                    let mut stmt = conn.prepare("SELECT path FROM images ORDER BY id ASC")?;
                    let mut rows = stmt.query([])?;
                    while let Some(row) = rows.next()? {
                        paths.push(row.get::<_, String>(0)?);
                    }
                }
                CollectionSelector::Collection(collection_id) => {
                    let exists: Option<i64> = conn
                        .query_row(
                            "SELECT id FROM collections WHERE id = ?1",
                            params![collection_id],
                            |row| row.get(0),
                        )
                        .optional()?;
                    if exists.is_none() {
                        return Err(anyhow!("Collection not found"));
                    }

                    let mut stmt = conn.prepare(
                        "SELECT images.path
                         FROM images
                         JOIN collection_images ON images.id = collection_images.image_id
                         WHERE collection_images.collection_id = ?1
                         ORDER BY collection_images.position ASC, collection_images.id ASC",
                    )?;
                    let mut rows = stmt.query(params![collection_id])?;
                    while let Some(row) = rows.next()? {
                        paths.push(row.get::<_, String>(0)?);
                    }
                }
            }
            Ok(paths)
        })
        .await
    }
}
