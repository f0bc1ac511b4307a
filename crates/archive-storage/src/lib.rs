//! # archive-storage
//!
//! Read-side adapters implementing [`IPhotoStore`](archive_core::IPhotoStore).
//!
//! | Adapter | Backing |
//! |---------|---------|
//! | [`SqlitePhotoStore`] | rusqlite, `photos` + `photo_removals` tables |
//! | [`InMemoryPhotoStore`] | dashmap arena keyed by photo id |
//!
//! Both validate raw records on the way out: a malformed record is skipped
//! with a warning and never reaches a detector.

pub mod engine;
pub mod memory_store;
pub mod migrations;
pub mod queries;

pub use engine::SqlitePhotoStore;
pub use memory_store::InMemoryPhotoStore;

use archive_core::errors::{ArchiveError, StoreError};
use archive_core::models::{Photo, RawPhotoRecord};
use chrono::{DateTime, SecondsFormat, Utc};

/// Wrap a message as a SQLite store error.
pub(crate) fn to_store_err(message: String) -> ArchiveError {
    StoreError::SqliteError { message }.into()
}

/// Fixed-width UTC timestamp so that text comparison orders correctly.
pub(crate) fn timestamp_text(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert raw records into photos, skipping (and logging) invalid ones.
///
/// The result is ordered by capture time, then id.
pub fn validate_records<I>(records: I) -> Vec<Photo>
where
    I: IntoIterator<Item = RawPhotoRecord>,
{
    let mut photos: Vec<Photo> = records
        .into_iter()
        .filter_map(|record| {
            let id = record.display_id().to_string();
            match Photo::try_from(record) {
                Ok(photo) => Some(photo),
                Err(e) => {
                    tracing::warn!(photo_id = %id, error = %e, "skipping invalid photo record");
                    None
                }
            }
        })
        .collect();
    sort_photos(&mut photos);
    photos
}

pub(crate) fn sort_photos(photos: &mut [Photo]) {
    photos.sort_by(|a, b| {
        a.captured_at
            .cmp(&b.captured_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
