use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::{Collection, ImageRecord},
};

fn row_to_collection(row: &Row) -> Result<Collection> {
    let created_at: String = row.get("created_at")?;

    Ok(Collection {
        id: row.get("id")?,
        name: row.get("name")?,
        image_count: row.get("image_count")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Collection name cannot be empty");
    }
    Ok(name.to_string())
}

fn ensure_collection_exists(conn: &Connection, collection_id: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM collections WHERE id = ?1",
            params![collection_id],
            |row| row.get(0),
        )
        .optional()?;

    match exists {
        Some(_) => Ok(()),
        None => Err(anyhow!("Collection not found")),
    }
}

fn ensure_name_available(conn: &Connection, name: &str, except_id: Option<i64>) -> Result<()> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) if Some(id) != except_id => bail!("A collection named '{name}' already exists"),
        _ => Ok(()),
    }
}

fn load_collection(conn: &Connection, collection_id: i64) -> Result<Collection> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.created_at,
                (SELECT COUNT(*) FROM collection_images ci WHERE ci.collection_id = c.id) AS image_count
         FROM collections c
         WHERE c.id = ?1",
    )?;
    let mut rows = stmt.query(params![collection_id])?;
    match rows.next()? {
        Some(row) => row_to_collection(row),
        None => Err(anyhow!("Collection not found")),
    }
}

fn member_ids(conn: &Connection, collection_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT image_id FROM collection_images
         WHERE collection_id = ?1
         ORDER BY position ASC, id ASC",
    )?;
    let mut rows = stmt.query(params![collection_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

impl Database {
    /// Create a new, empty collection. Names are trimmed and must be unique.
    pub async fn create_collection(&self, name: String) -> Result<Collection> {
        self.execute(move |conn| {
            let name = normalize_name(&name)?;
            ensure_name_available(conn, &name, None)?;

            conn.execute(
                "INSERT INTO collections (name, created_at) VALUES (?1, ?2)",
                params![name, Utc::now().to_rfc3339()],
            )?;

            load_collection(conn, conn.last_insert_rowid())
        })
        .await
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, c.created_at, COUNT(ci.id) AS image_count
                 FROM collections c
                 LEFT JOIN collection_images ci ON ci.collection_id = c.id
                 GROUP BY c.id
                 ORDER BY c.name COLLATE NOCASE ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut collections = Vec::new();
            while let Some(row) = rows.next()? {
                collections.push(row_to_collection(row)?);
            }

            Ok(collections)
        })
        .await
    }

    pub async fn get_collection(&self, collection_id: i64) -> Result<Collection> {
        self.execute(move |conn| load_collection(conn, collection_id))
            .await
    }

    pub async fn rename_collection(&self, collection_id: i64, name: String) -> Result<Collection> {
        self.execute(move |conn| {
            let name = normalize_name(&name)?;
            ensure_collection_exists(conn, collection_id)?;
            ensure_name_available(conn, &name, Some(collection_id))?;

            conn.execute(
                "UPDATE collections SET name = ?1 WHERE id = ?2",
                params![name, collection_id],
            )?;

            load_collection(conn, collection_id)
        })
        .await
    }

    /// Delete a collection. Memberships are removed by ON DELETE CASCADE;
    /// the images themselves stay in the library.
    pub async fn delete_collection(&self, collection_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM collections WHERE id = ?1",
                params![collection_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Collection not found"));
            }

            Ok(())
        })
        .await
    }

    /// Append images to a collection in the given order. Images that are
    /// already members keep their place. Returns how many were added.
    pub async fn add_images_to_collection(
        &self,
        collection_id: i64,
        image_ids: Vec<i64>,
    ) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            ensure_collection_exists(&tx, collection_id)?;

            let mut next_position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM collection_images WHERE collection_id = ?1",
                params![collection_id],
                |row| row.get(0),
            )?;

            let mut added = 0;
            {
                let mut image_exists = tx.prepare("SELECT 1 FROM images WHERE id = ?1")?;
                let mut insert = tx.prepare(
                    "INSERT OR IGNORE INTO collection_images (collection_id, image_id, position)
                     VALUES (?1, ?2, ?3)",
                )?;

                for image_id in image_ids {
                    if !image_exists.exists(params![image_id])? {
                        bail!("Image {image_id} not found");
                    }
                    if insert.execute(params![collection_id, image_id, next_position])? > 0 {
                        next_position += 1;
                        added += 1;
                    }
                }
            }

            tx.commit()?;
            Ok(added)
        })
        .await
    }

    pub async fn remove_image_from_collection(&self, collection_id: i64, image_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM collection_images WHERE collection_id = ?1 AND image_id = ?2",
                params![collection_id, image_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Image is not in this collection"));
            }

            Ok(())
        })
        .await
    }

    /// Persist a custom order. `image_ids` must name every current member
    /// exactly once.
    pub async fn reorder_collection(&self, collection_id: i64, image_ids: Vec<i64>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            ensure_collection_exists(&tx, collection_id)?;

            let current: HashSet<i64> = member_ids(&tx, collection_id)?.into_iter().collect();
            let requested: HashSet<i64> = image_ids.iter().copied().collect();
            if requested.len() != image_ids.len() {
                bail!("Image order contains duplicates");
            }
            if requested != current {
                bail!("Image order must list exactly the collection's current images");
            }

            {
                let mut update = tx.prepare(
                    "UPDATE collection_images SET position = ?1
                     WHERE collection_id = ?2 AND image_id = ?3",
                )?;
                for (position, image_id) in image_ids.iter().enumerate() {
                    update.execute(params![position as i64, collection_id, image_id])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn collection_images(&self, collection_id: i64) -> Result<Vec<ImageRecord>> {
        self.execute(move |conn| {
            ensure_collection_exists(conn, collection_id)?;

            let mut stmt = conn.prepare(
                "SELECT images.id, images.path, images.added_at
                 FROM images
                 JOIN collection_images ON images.id = collection_images.image_id
                 WHERE collection_images.collection_id = ?1
                 ORDER BY collection_images.position ASC, collection_images.id ASC",
            )?;

            let mut rows = stmt.query(params![collection_id])?;
            let mut images = Vec::new();
            while let Some(row) = rows.next()? {
                let added_at: String = row.get(2)?;
                images.push(ImageRecord {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    added_at: parse_datetime(&added_at, "added_at")?,
                });
            }

            Ok(images)
        })
        .await
    }
}
