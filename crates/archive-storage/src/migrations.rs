//! Schema migrations, tracked with `PRAGMA user_version`.

use rusqlite::Connection;

use archive_core::errors::{ArchiveResult, StoreError};

use crate::to_store_err;

/// Latest schema version.
pub const LATEST_VERSION: u32 = 1;

/// Bring the schema up to [`LATEST_VERSION`].
pub fn run_migrations(conn: &Connection) -> ArchiveResult<()> {
    let current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| to_store_err(format!("read user_version: {e}")))?;

    if current < 1 {
        v001_photos(conn).map_err(|e| StoreError::MigrationFailed {
            version: 1,
            reason: e.to_string(),
        })?;
    }

    if current < LATEST_VERSION {
        conn.pragma_update(None, "user_version", LATEST_VERSION)
            .map_err(|e| to_store_err(format!("write user_version: {e}")))?;
        tracing::info!(from = current, to = LATEST_VERSION, "photo store schema migrated");
    }
    Ok(())
}

/// v001: photos, photo_removals.
///
/// Columns are loosely typed on purpose: the enrichment pipeline writes raw
/// values and validation happens when rows are read.
fn v001_photos(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS photos (
            id                TEXT PRIMARY KEY,
            event_id          TEXT,
            athlete_id        TEXT,
            captured_at       TEXT,
            play_type         TEXT,
            action_intensity  TEXT,
            emotion           TEXT,
            sharpness         REAL,
            composition_score REAL,
            emotional_impact  REAL,
            time_in_game      TEXT,
            updated_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_photos_event ON photos(event_id);
        CREATE INDEX IF NOT EXISTS idx_photos_athlete ON photos(athlete_id);
        CREATE INDEX IF NOT EXISTS idx_photos_captured ON photos(captured_at);
        CREATE INDEX IF NOT EXISTS idx_photos_updated ON photos(updated_at);

        CREATE TABLE IF NOT EXISTS photo_removals (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id    TEXT NOT NULL,
            event_id    TEXT,
            athlete_id  TEXT,
            captured_at TEXT,
            removed_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_removals_removed ON photo_removals(removed_at);
        ",
    )
}
