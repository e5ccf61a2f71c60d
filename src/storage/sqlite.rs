use super::{Storage, StorageResult};
use crate::error::StorageError;
use crate::hash_ids::HashIds;
use crate::types::{Category, Event, EventData, EventKey, Image};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS images (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        crc32       INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_images_crc32 ON images (crc32);
    CREATE TABLE IF NOT EXISTS events (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        original_event_id  INTEGER NOT NULL,
        start_date         TEXT NOT NULL,
        name               TEXT NOT NULL,
        type               TEXT NOT NULL CHECK (type IN ('retreat', 'seminar', 'silent-retreat')),
        days               INTEGER NOT NULL,
        image_id           INTEGER NOT NULL REFERENCES images (id),
        loc_name           TEXT NOT NULL,
        loc_address        TEXT NOT NULL,
        loc_original_link  TEXT NOT NULL,
        loc_lat            REAL NOT NULL,
        loc_lng            REAL NOT NULL,
        private            INTEGER NOT NULL DEFAULT 0,
        created_at         TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at         TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE (original_event_id, start_date)
    );
"#;

const EVENT_COLUMNS: &str = "id, original_event_id, start_date, name, type, days, image_id, \
     loc_name, loc_address, loc_original_link, loc_lat, loc_lng, private";

/// SQLite-backed storage; the schema is created on open.
///
/// Statements run on tokio's blocking pool, one at a time.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
    hash_ids: HashIds,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P, hash_ids: HashIds) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened database at {}", path.display());
        Self::with_connection(conn, hash_ids)
    }

    pub fn open_in_memory(hash_ids: HashIds) -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, hash_ids)
    }

    fn with_connection(conn: Connection, hash_ids: HashIds) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            hash_ids,
        })
    }

    /// Run `f` against the locked connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection, &HashIds) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let hash_ids = self.hash_ids.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&conn, &hash_ids)
        })
        .await?
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<RawEventRow> {
    Ok(RawEventRow {
        id: row.get(0)?,
        original_event_id: row.get(1)?,
        start_date: row.get(2)?,
        name: row.get(3)?,
        category: row.get(4)?,
        days: row.get(5)?,
        image_id: row.get(6)?,
        location_name: row.get(7)?,
        location_address: row.get(8)?,
        original_link: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
        private: row.get(12)?,
    })
}

fn query_event(
    conn: &Connection,
    hash_ids: &HashIds,
    clause: &str,
    params: impl rusqlite::Params,
) -> StorageResult<Option<Event>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE {clause}");
    let raw = conn.query_row(&sql, params, event_from_row).optional()?;
    raw.map(|r| r.into_event(hash_ids)).transpose()
}

/// Row as stored, before the text columns are validated.
struct RawEventRow {
    id: i64,
    original_event_id: u32,
    start_date: String,
    name: String,
    category: String,
    days: u32,
    image_id: i64,
    location_name: String,
    location_address: String,
    original_link: String,
    latitude: f64,
    longitude: f64,
    private: bool,
}

impl RawEventRow {
    fn into_event(self, hash_ids: &HashIds) -> StorageResult<Event> {
        let start_date = NaiveDate::parse_from_str(&self.start_date, DATE_FORMAT).map_err(|e| {
            StorageError::Corrupt(format!("event {} start_date: {}", self.id, e))
        })?;
        let category = Category::parse(&self.category).ok_or_else(|| {
            StorageError::Corrupt(format!("event {} type: {}", self.id, self.category))
        })?;
        Ok(Event {
            id: self.id,
            hash_id: hash_ids.encode(self.id),
            original_event_id: self.original_event_id,
            start_date,
            name: self.name,
            category,
            days: self.days,
            image_id: self.image_id,
            location_name: self.location_name,
            location_address: self.location_address,
            original_link: self.original_link,
            latitude: self.latitude,
            longitude: self.longitude,
            private: self.private,
        })
    }
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        name: row.get(1)?,
        crc32: row.get(2)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn find_event_by_key(&self, key: &EventKey) -> StorageResult<Option<Event>> {
        let key = *key;
        self.run(move |conn, hash_ids| {
            query_event(
                conn,
                hash_ids,
                "original_event_id = ?1 AND start_date = ?2",
                params![
                    key.original_event_id,
                    key.start_date.format(DATE_FORMAT).to_string()
                ],
            )
        })
        .await
    }

    async fn create_event(&self, key: EventKey, data: EventData) -> StorageResult<Event> {
        self.run(move |conn, hash_ids| {
            conn.execute(
                "INSERT INTO events (original_event_id, start_date, name, type, days, image_id,
                    loc_name, loc_address, loc_original_link, loc_lat, loc_lng)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    key.original_event_id,
                    key.start_date.format(DATE_FORMAT).to_string(),
                    data.name,
                    data.category.as_str(),
                    data.days,
                    data.image_id,
                    data.location_name,
                    data.location_address,
                    data.original_link,
                    data.latitude,
                    data.longitude,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Created event: {} with id {}", data.name, id);
            query_event(conn, hash_ids, "id = ?1", params![id])?.ok_or(StorageError::NotFound(id))
        })
        .await
    }

    async fn update_event(&self, id: i64, data: EventData) -> StorageResult<Event> {
        self.run(move |conn, hash_ids| {
            let changed = conn.execute(
                "UPDATE events SET name = ?1, type = ?2, days = ?3, image_id = ?4, loc_name = ?5,
                    loc_address = ?6, loc_original_link = ?7, loc_lat = ?8, loc_lng = ?9,
                    updated_at = datetime('now')
                 WHERE id = ?10",
                params![
                    data.name,
                    data.category.as_str(),
                    data.days,
                    data.image_id,
                    data.location_name,
                    data.location_address,
                    data.original_link,
                    data.latitude,
                    data.longitude,
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(id));
            }
            debug!("Updated event: {} with id {}", data.name, id);
            query_event(conn, hash_ids, "id = ?1", params![id])?.ok_or(StorageError::NotFound(id))
        })
        .await
    }

    async fn list_events(&self) -> StorageResult<Vec<Event>> {
        self.run(|conn, hash_ids| {
            let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY start_date, id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], event_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(|r| r.into_event(hash_ids)).collect()
        })
        .await
    }

    async fn find_image_by_crc32(&self, crc32: u32) -> StorageResult<Option<Image>> {
        self.run(move |conn, _| {
            let image = conn
                .query_row(
                    "SELECT id, name, crc32 FROM images WHERE crc32 = ?1 ORDER BY id LIMIT 1",
                    params![crc32],
                    image_from_row,
                )
                .optional()?;
            Ok(image)
        })
        .await
    }

    async fn image_name_exists(&self, name: &str) -> StorageResult<bool> {
        let name = name.to_string();
        self.run(move |conn, _| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM images WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    async fn create_image(&self, name: &str, crc32: u32) -> StorageResult<Image> {
        let name = name.to_string();
        self.run(move |conn, _| {
            conn.execute(
                "INSERT INTO images (name, crc32) VALUES (?1, ?2)",
                params![name, crc32],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Created image: {} with id {}", name, id);
            Ok(Image { id, name, crc32 })
        })
        .await
    }
}
