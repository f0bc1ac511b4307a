//! SqlitePhotoStore — owns the connection, runs migrations, implements IPhotoStore.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use archive_core::errors::{ArchiveError, ArchiveResult, StoreError};
use archive_core::models::{Photo, PhotoFilter, RawPhotoRecord, Scope};
use archive_core::traits::IPhotoStore;

use crate::{migrations, queries, to_store_err, validate_records};

/// SQLite-backed metadata store.
///
/// The enrichment pipeline writes through [`insert_raw`](Self::insert_raw);
/// the curation engine only reads through [`IPhotoStore`].
pub struct SqlitePhotoStore {
    conn: Mutex<Connection>,
}

impl SqlitePhotoStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| to_store_err(format!("open {}: {e}", path.display())))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| to_store_err(format!("enable WAL: {e}")))?;
        Self::initialize(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> ArchiveResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| to_store_err(format!("open memory: {e}")))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> ArchiveResult<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> ArchiveResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            StoreError::Unavailable {
                reason: "connection mutex poisoned".to_string(),
            }
            .into()
        })
    }

    /// Store a raw record as produced by the enrichment pipeline.
    ///
    /// Only the id is required here; the remaining fields are checked when read.
    pub fn insert_raw(&self, record: &RawPhotoRecord) -> ArchiveResult<()> {
        let id = record
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ArchiveError::InvalidPhotoRecord {
                photo_id: record.display_id().to_string(),
                reason: "missing id".to_string(),
            })?;
        let conn = self.lock()?;
        queries::upsert_raw(&conn, id, record, Utc::now())
    }

    /// Insert or update a typed photo.
    pub fn upsert(&self, photo: &Photo) -> ArchiveResult<()> {
        photo.validate()?;
        self.insert_raw(&RawPhotoRecord::from(photo))
    }

    /// Remove a photo. Returns whether it existed.
    pub fn remove(&self, id: &str) -> ArchiveResult<bool> {
        let conn = self.lock()?;
        queries::delete(&conn, id, Utc::now())
    }

    /// Number of stored rows, valid or not.
    pub fn row_count(&self) -> ArchiveResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
            .map_err(|e| to_store_err(e.to_string()))?;
        Ok(count as usize)
    }
}

impl IPhotoStore for SqlitePhotoStore {
    fn query_photos_by_event(&self, event_id: &str) -> ArchiveResult<Vec<Photo>> {
        let raw = {
            let conn = self.lock()?;
            queries::query_by_event(&conn, event_id)?
        };
        Ok(validate_records(raw))
    }

    fn query_photos_by_athlete(&self, athlete_id: &str) -> ArchiveResult<Vec<Photo>> {
        let raw = {
            let conn = self.lock()?;
            queries::query_by_athlete(&conn, athlete_id)?
        };
        Ok(validate_records(raw))
    }

    fn query_all_photos(&self, filter: Option<&PhotoFilter>) -> ArchiveResult<Vec<Photo>> {
        let raw = {
            let conn = self.lock()?;
            queries::query_all(&conn)?
        };
        let mut photos = validate_records(raw);
        if let Some(filter) = filter {
            photos.retain(|p| filter.matches(p));
        }
        Ok(photos)
    }

    fn changed_since(&self, scope_key: &str, since: DateTime<Utc>) -> ArchiveResult<bool> {
        let scope: Scope = scope_key
            .parse()
            .map_err(|reason: String| StoreError::InvalidScope {
                scope_key: scope_key.to_string(),
                reason,
            })?;
        let conn = self.lock()?;
        let updated = queries::updated_since(&conn, since)?;
        if updated.iter().any(|r| queries::raw_in_scope(&scope, r)) {
            return Ok(true);
        }
        let removed = queries::removed_since(&conn, since)?;
        Ok(removed.iter().any(|r| queries::raw_in_scope(&scope, r)))
    }
}
