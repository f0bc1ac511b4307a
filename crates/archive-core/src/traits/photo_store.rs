use chrono::{DateTime, Utc};

use crate::errors::ArchiveResult;
use crate::models::{Photo, PhotoFilter};

/// Read-only query interface over the tagged-photo collection.
///
/// Implementations validate records before returning them; malformed records
/// are skipped, never surfaced to the caller.
pub trait IPhotoStore: Send + Sync {
    fn query_photos_by_event(&self, event_id: &str) -> ArchiveResult<Vec<Photo>>;
    fn query_photos_by_athlete(&self, athlete_id: &str) -> ArchiveResult<Vec<Photo>>;
    fn query_all_photos(&self, filter: Option<&PhotoFilter>) -> ArchiveResult<Vec<Photo>>;

    /// Whether any photo in the scope identified by `scope_key` was added,
    /// updated, or removed after `since`.
    fn changed_since(&self, scope_key: &str, since: DateTime<Utc>) -> ArchiveResult<bool>;
}
