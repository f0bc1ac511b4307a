//! Story cache keyed by (arc type, scope key).
//!
//! Built on `moka::future::Cache`. Concurrent misses on one key share a single
//! in-flight generation; failed generations are not cached. Each entry expires
//! at its own `expires_at`, so tombstones can live shorter than arcs and
//! imported entries keep their remaining lifetime.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};

use archive_core::config::CacheConfig;
use archive_core::errors::{ArchiveError, ArchiveResult, CurationError};
use archive_core::models::{ArcType, NarrativeArc};

/// Snapshot format version written by [`StoryCache::export_json`].
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryKey {
    pub arc_type: ArcType,
    pub scope_key: String,
}

impl StoryKey {
    pub fn new(arc_type: ArcType, scope_key: impl Into<String>) -> Self {
        Self {
            arc_type,
            scope_key: scope_key.into(),
        }
    }
}

impl fmt::Display for StoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.arc_type, self.scope_key)
    }
}

/// A cached generation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CachedStory {
    Story {
        arc: NarrativeArc,
    },
    /// The detector ran and found no arc.
    #[serde(rename_all = "camelCase")]
    NoStory {
        reason: String,
        expires_at: DateTime<Utc>,
    },
}

impl CachedStory {
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Self::Story { arc } => arc.expires_at,
            Self::NoStory { expires_at, .. } => *expires_at,
        }
    }

    pub fn arc(&self) -> Option<&NarrativeArc> {
        match self {
            Self::Story { arc } => Some(arc),
            Self::NoStory { .. } => None,
        }
    }

    fn remaining(&self) -> Duration {
        (self.expires_at() - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

struct StoryExpiry;

impl Expiry<StoryKey, CachedStory> for StoryExpiry {
    fn expire_after_create(
        &self,
        _key: &StoryKey,
        value: &CachedStory,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &StoryKey,
        value: &CachedStory,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<E> {
    version: u32,
    entries: Vec<E>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEntry {
    key: StoryKey,
    value: CachedStory,
}

/// Outcome of [`StoryCache::import_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub loaded: usize,
    pub expired: usize,
    pub corrupted: usize,
}

/// Story cache with single-flight generation and hit/miss tracking.
pub struct StoryCache {
    cache: Cache<StoryKey, CachedStory>,
    tombstone_ttl: chrono::Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(StoryExpiry)
            .build();
        Self {
            cache,
            tombstone_ttl: chrono::Duration::from_std(config.tombstone_ttl())
                .unwrap_or_else(|_| chrono::Duration::days(1)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A "no arc" entry expiring after the tombstone TTL.
    pub fn tombstone(&self, reason: impl Into<String>, now: DateTime<Utc>) -> CachedStory {
        CachedStory::NoStory {
            reason: reason.into(),
            expires_at: now
                .checked_add_signed(self.tombstone_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Serve `key` from the cache, or run `generate` exactly once across all
    /// concurrent callers. Errors are returned to every waiter and not cached.
    pub async fn get_or_generate<F>(&self, key: StoryKey, generate: F) -> ArchiveResult<CachedStory>
    where
        F: Future<Output = ArchiveResult<CachedStory>>,
    {
        let ran = AtomicBool::new(false);
        let arc_type = key.arc_type;
        let result = self
            .cache
            .try_get_with(key, async {
                ran.store(true, Ordering::Relaxed);
                generate.await
            })
            .await;

        if ran.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result.map_err(|shared| unshare(arc_type, shared))
    }

    /// Look up without generating or touching the counters.
    pub async fn peek(&self, key: &StoryKey) -> Option<CachedStory> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: StoryKey, value: CachedStory) {
        self.cache.insert(key, value).await;
    }

    /// Drop every arc type's entry for a scope. Returns the ids of removed arcs.
    pub async fn invalidate_scope(&self, scope_key: &str) -> Vec<String> {
        let mut removed = Vec::new();
        for arc_type in ArcType::ALL {
            let key = StoryKey::new(arc_type, scope_key);
            if let Some(CachedStory::Story { arc }) = self.cache.remove(&key).await {
                removed.push(arc.id);
            }
        }
        removed
    }

    /// Live arcs currently cached.
    pub fn arcs(&self) -> Vec<NarrativeArc> {
        let now = Utc::now();
        self.cache
            .iter()
            .filter_map(|(_, value)| match value {
                CachedStory::Story { arc } if !arc.is_expired(now) => Some(arc),
                _ => None,
            })
            .collect()
    }

    /// Serialize all live entries.
    pub fn export_json(&self) -> ArchiveResult<String> {
        let now = Utc::now();
        let mut entries: Vec<SnapshotEntry> = self
            .cache
            .iter()
            .filter(|(_, value)| value.expires_at() > now)
            .map(|(key, value)| SnapshotEntry {
                key: (*key).clone(),
                value,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.key
                .scope_key
                .cmp(&b.key.scope_key)
                .then(a.key.arc_type.cmp(&b.key.arc_type))
        });
        Ok(serde_json::to_string(&Snapshot {
            version: SNAPSHOT_VERSION,
            entries,
        })?)
    }

    /// Warm the cache from an exported snapshot.
    ///
    /// Entries that fail to deserialize are logged as corrupted and skipped;
    /// they will be regenerated on demand. Expired entries are dropped.
    pub async fn import_json(&self, json: &str) -> ArchiveResult<ImportSummary> {
        let snapshot: Snapshot<serde_json::Value> = serde_json::from_str(json)?;
        let now = Utc::now();
        let mut summary = ImportSummary::default();

        for (position, raw) in snapshot.entries.into_iter().enumerate() {
            let entry: SnapshotEntry = match serde_json::from_value(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    let err = ArchiveError::CacheCorruption {
                        key: format!("entry #{position}"),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %err, "skipping corrupted cache entry");
                    summary.corrupted += 1;
                    continue;
                }
            };
            if entry.value.expires_at() <= now {
                summary.expired += 1;
                continue;
            }
            if let CachedStory::Story { arc } = &entry.value {
                if arc.arc_type != entry.key.arc_type || arc.scope_key != entry.key.scope_key {
                    let err = ArchiveError::CacheCorruption {
                        key: entry.key.to_string(),
                        reason: format!("holds arc {} for {}", arc.id, arc.scope_key),
                    };
                    tracing::warn!(error = %err, "skipping corrupted cache entry");
                    summary.corrupted += 1;
                    continue;
                }
            }
            self.cache.insert(entry.key, entry.value).await;
            summary.loaded += 1;
        }

        tracing::info!(
            loaded = summary.loaded,
            expired = summary.expired,
            corrupted = summary.corrupted,
            "story cache snapshot imported"
        );
        Ok(summary)
    }

    /// Total cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses, i.e. generations run.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Cache hit rate (0.0–1.0).
    pub fn hit_rate(&self) -> f64 {
        let h = self.hits() as f64;
        let m = self.misses() as f64;
        let total = h + m;
        if total == 0.0 {
            0.0
        } else {
            h / total
        }
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

/// Recover an owned error from one shared between single-flight waiters.
fn unshare(arc_type: ArcType, shared: Arc<ArchiveError>) -> ArchiveError {
    match Arc::try_unwrap(shared) {
        Ok(err) => err,
        Err(shared) => match shared.as_ref() {
            ArchiveError::MetadataStoreUnavailable {
                scope_key,
                attempts,
                reason,
            } => ArchiveError::MetadataStoreUnavailable {
                scope_key: scope_key.clone(),
                attempts: *attempts,
                reason: reason.clone(),
            },
            ArchiveError::CurationError(CurationError::Cancelled { arc_type }) => {
                CurationError::Cancelled {
                    arc_type: *arc_type,
                }
                .into()
            }
            other => CurationError::GenerationFailed {
                arc_type,
                reason: other.to_string(),
            }
            .into(),
        },
    }
}
