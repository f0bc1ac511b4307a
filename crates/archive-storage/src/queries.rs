//! Row-level queries over the `photos` and `photo_removals` tables.
//!
//! Everything here returns [`RawPhotoRecord`]s; validation is the caller's job.

use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};

use archive_core::errors::ArchiveResult;
use archive_core::models::{RawPhotoRecord, Scope};

use crate::{timestamp_text, to_store_err};

/// The base SELECT columns for all photo queries (11 columns, indices 0-10).
const PHOTO_COLUMNS: &str = "id, event_id, athlete_id, captured_at, play_type,
     action_intensity, emotion, sharpness, composition_score, emotional_impact,
     time_in_game";

pub fn query_by_event(conn: &Connection, event_id: &str) -> ArchiveResult<Vec<RawPhotoRecord>> {
    collect_raw(
        conn,
        &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE event_id = ?1"),
        params![event_id],
    )
}

pub fn query_by_athlete(
    conn: &Connection,
    athlete_id: &str,
) -> ArchiveResult<Vec<RawPhotoRecord>> {
    collect_raw(
        conn,
        &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE athlete_id = ?1"),
        params![athlete_id],
    )
}

pub fn query_all(conn: &Connection) -> ArchiveResult<Vec<RawPhotoRecord>> {
    collect_raw(conn, &format!("SELECT {PHOTO_COLUMNS} FROM photos"), [])
}

/// Rows written strictly after `since`.
pub fn updated_since(
    conn: &Connection,
    since: DateTime<Utc>,
) -> ArchiveResult<Vec<RawPhotoRecord>> {
    collect_raw(
        conn,
        &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE updated_at > ?1"),
        params![timestamp_text(since)],
    )
}

/// Removals recorded strictly after `since`, as partial records.
pub fn removed_since(
    conn: &Connection,
    since: DateTime<Utc>,
) -> ArchiveResult<Vec<RawPhotoRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT photo_id, event_id, athlete_id, captured_at
             FROM photo_removals WHERE removed_at > ?1",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![timestamp_text(since)], |row| {
            Ok(RawPhotoRecord {
                id: text_at(row, 0)?,
                event_id: text_at(row, 1)?,
                athlete_id: text_at(row, 2)?,
                captured_at: text_at(row, 3)?,
                ..Default::default()
            })
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_store_err(e.to_string()))
}

/// Insert or replace a raw record, stamping `updated_at`.
pub fn upsert_raw(
    conn: &Connection,
    id: &str,
    record: &RawPhotoRecord,
    updated_at: DateTime<Utc>,
) -> ArchiveResult<()> {
    conn.execute(
        "INSERT INTO photos (
            id, event_id, athlete_id, captured_at, play_type, action_intensity,
            emotion, sharpness, composition_score, emotional_impact, time_in_game,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            event_id = excluded.event_id,
            athlete_id = excluded.athlete_id,
            captured_at = excluded.captured_at,
            play_type = excluded.play_type,
            action_intensity = excluded.action_intensity,
            emotion = excluded.emotion,
            sharpness = excluded.sharpness,
            composition_score = excluded.composition_score,
            emotional_impact = excluded.emotional_impact,
            time_in_game = excluded.time_in_game,
            updated_at = excluded.updated_at",
        params![
            id,
            record.event_id,
            record.athlete_id,
            record.captured_at,
            record.play_type,
            record.action_intensity,
            record.emotion,
            record.sharpness,
            record.composition_score,
            record.emotional_impact,
            record.time_in_game,
            timestamp_text(updated_at),
        ],
    )
    .map_err(|e| to_store_err(format!("upsert photo {id}: {e}")))?;
    Ok(())
}

/// Delete a photo and record the removal. Returns whether a row existed.
pub fn delete(conn: &Connection, id: &str, removed_at: DateTime<Utc>) -> ArchiveResult<bool> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_store_err(format!("delete begin: {e}")))?;

    let inserted = tx
        .execute(
            "INSERT INTO photo_removals (photo_id, event_id, athlete_id, captured_at, removed_at)
             SELECT id, event_id, athlete_id, captured_at, ?2 FROM photos WHERE id = ?1",
            params![id, timestamp_text(removed_at)],
        )
        .map_err(|e| to_store_err(format!("record removal {id}: {e}")))?;
    tx.execute("DELETE FROM photos WHERE id = ?1", params![id])
        .map_err(|e| to_store_err(format!("delete photo {id}: {e}")))?;

    tx.commit()
        .map_err(|e| to_store_err(format!("delete commit: {e}")))?;
    Ok(inserted > 0)
}

/// Whether a raw record belongs to a scope, judged from its raw columns.
///
/// Season membership needs a parseable `captured_at`; records without one
/// are treated as outside the window.
pub fn raw_in_scope(scope: &Scope, record: &RawPhotoRecord) -> bool {
    match scope {
        Scope::Event { event_id } => record.event_id.as_deref() == Some(event_id),
        Scope::Athlete { athlete_id } => record.athlete_id.as_deref() == Some(athlete_id),
        Scope::Global => true,
        Scope::Season { from, to } => record
            .captured_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .is_some_and(|t| t >= *from && t < *to),
    }
}

fn collect_raw<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> ArchiveResult<Vec<RawPhotoRecord>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, parse_raw_row)
        .map_err(|e| to_store_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_store_err(e.to_string()))
}

fn parse_raw_row(row: &Row<'_>) -> rusqlite::Result<RawPhotoRecord> {
    Ok(RawPhotoRecord {
        id: text_at(row, 0)?,
        event_id: text_at(row, 1)?,
        athlete_id: text_at(row, 2)?,
        captured_at: text_at(row, 3)?,
        play_type: text_at(row, 4)?,
        action_intensity: text_at(row, 5)?,
        emotion: text_at(row, 6)?,
        sharpness: real_at(row, 7)?,
        composition_score: real_at(row, 8)?,
        emotional_impact: real_at(row, 9)?,
        time_in_game: text_at(row, 10)?,
    })
}

/// Read any storage class as text; NULL is `None`.
fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
    })
}

/// Read a numeric column leniently; unparseable text is `None` and fails validation later.
fn real_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Real(f) => Some(f),
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}
