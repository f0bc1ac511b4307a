//! In-memory photo arena keyed by id, with per-photo change stamps.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use archive_core::errors::{ArchiveResult, StoreError};
use archive_core::models::{Photo, PhotoFilter, RawPhotoRecord, Scope};
use archive_core::traits::IPhotoStore;

use crate::{sort_photos, validate_records};

#[derive(Debug, Clone)]
struct StoredPhoto {
    photo: Photo,
    changed_at: DateTime<Utc>,
}

/// Photo store held entirely in memory.
///
/// Used for fixtures, tests, and deployments where the enrichment pipeline
/// pushes its output straight into the engine process.
#[derive(Debug, Default)]
pub struct InMemoryPhotoStore {
    photos: DashMap<String, StoredPhoto>,
    removals: DashMap<String, StoredPhoto>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-typed photos. Photos failing validation are skipped.
    pub fn from_photos(photos: impl IntoIterator<Item = Photo>) -> Self {
        let store = Self::new();
        for photo in photos {
            if let Err(e) = store.upsert(photo) {
                tracing::warn!(error = %e, "skipping invalid photo");
            }
        }
        store
    }

    /// Build from raw pipeline records, skipping invalid ones.
    pub fn from_records(records: impl IntoIterator<Item = RawPhotoRecord>) -> Self {
        Self::from_photos(validate_records(records))
    }

    /// Build from a JSON array of raw records.
    pub fn from_json(json: &str) -> ArchiveResult<Self> {
        let records: Vec<RawPhotoRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Insert or replace a photo, stamping it as changed now.
    pub fn upsert(&self, photo: Photo) -> ArchiveResult<()> {
        photo.validate()?;
        let id = photo.id.clone();
        self.removals.remove(&id);
        self.photos.insert(
            id,
            StoredPhoto {
                photo,
                changed_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Remove a photo. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        match self.photos.remove(id) {
            Some((id, stored)) => {
                self.removals.insert(
                    id,
                    StoredPhoto {
                        photo: stored.photo,
                        changed_at: Utc::now(),
                    },
                );
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    fn collect<F>(&self, predicate: F) -> Vec<Photo>
    where
        F: Fn(&Photo) -> bool,
    {
        let mut photos: Vec<Photo> = self
            .photos
            .iter()
            .filter(|entry| predicate(&entry.photo))
            .map(|entry| entry.photo.clone())
            .collect();
        sort_photos(&mut photos);
        photos
    }
}

impl IPhotoStore for InMemoryPhotoStore {
    fn query_photos_by_event(&self, event_id: &str) -> ArchiveResult<Vec<Photo>> {
        Ok(self.collect(|p| p.event_id == event_id))
    }

    fn query_photos_by_athlete(&self, athlete_id: &str) -> ArchiveResult<Vec<Photo>> {
        Ok(self.collect(|p| p.athlete_id.as_deref() == Some(athlete_id)))
    }

    fn query_all_photos(&self, filter: Option<&PhotoFilter>) -> ArchiveResult<Vec<Photo>> {
        Ok(self.collect(|p| filter.map_or(true, |f| f.matches(p))))
    }

    fn changed_since(&self, scope_key: &str, since: DateTime<Utc>) -> ArchiveResult<bool> {
        let scope: Scope = scope_key
            .parse()
            .map_err(|reason: String| StoreError::InvalidScope {
                scope_key: scope_key.to_string(),
                reason,
            })?;
        let changed = |entry: &StoredPhoto| entry.changed_at > since && scope.contains(&entry.photo);
        Ok(self.photos.iter().any(|e| changed(e.value()))
            || self.removals.iter().any(|e| changed(e.value())))
    }
}
