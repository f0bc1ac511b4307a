//! CurationEngine: fans a request out to the applicable detectors under a
//! deadline, merges and ranks their arcs, and keeps the story index.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use archive_core::config::{ArchiveConfig, OrchestratorConfig};
use archive_core::errors::{ArchiveError, ArchiveResult, CurationError};
use archive_core::models::{ArcType, NarrativeArc, Photo, Scope};
use archive_core::traits::IPhotoStore;

use crate::assembler::ArcAssembler;
use crate::cache::{CachedStory, ImportSummary, StoryCache, StoryKey};
use crate::detectors;
use crate::retry::RetryPolicy;
use crate::scorer::ConfidenceScorer;
use crate::{curation_span, detector_span};

/// The scope's photos, fetched at most once per request. A failed fetch is
/// remembered too, so detectors of one request never retry it separately.
type Snapshot = Arc<OnceCell<Result<Arc<Vec<Photo>>, StoreFailure>>>;

#[derive(Debug, Clone)]
struct StoreFailure {
    scope_key: String,
    attempts: u32,
    reason: String,
}

impl StoreFailure {
    fn from_error(scope_key: &str, err: ArchiveError) -> Self {
        match err {
            ArchiveError::MetadataStoreUnavailable {
                scope_key,
                attempts,
                reason,
            } => Self {
                scope_key,
                attempts,
                reason,
            },
            other => Self {
                scope_key: scope_key.to_string(),
                attempts: 1,
                reason: other.to_string(),
            },
        }
    }

    fn to_error(&self) -> ArchiveError {
        ArchiveError::MetadataStoreUnavailable {
            scope_key: self.scope_key.clone(),
            attempts: self.attempts,
            reason: self.reason.clone(),
        }
    }
}

/// Why a detector contributed no arc to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OmissionReason {
    /// The detector ran and its pattern was absent.
    NoArc { detail: String },
    TimedOut,
    Failed { detail: String },
    StoreUnavailable { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Omission {
    #[serde(rename = "type")]
    pub arc_type: ArcType,
    pub reason: OmissionReason,
}

/// Arcs for one scope plus the detectors that produced none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationReport {
    pub request_id: String,
    pub scope_key: String,
    /// Ranked by confidence descending, then arc type.
    pub arcs: Vec<NarrativeArc>,
    /// In arc type order.
    pub omissions: Vec<Omission>,
    pub generated_at: DateTime<Utc>,
}

/// Story curation orchestrator.
///
/// Cheap to clone; clones share the cache, the story index, and the store.
#[derive(Clone)]
pub struct CurationEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn IPhotoStore>,
    cache: StoryCache,
    scorer: ConfidenceScorer,
    assembler: ArcAssembler,
    retry: RetryPolicy,
    config: OrchestratorConfig,
    /// Arc id → arc, for `get_story`.
    index: DashMap<String, NarrativeArc>,
    /// Scope key → start of its last successful generation.
    last_generated: DashMap<String, DateTime<Utc>>,
}

impl CurationEngine {
    pub fn new(store: Arc<dyn IPhotoStore>, config: &ArchiveConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                cache: StoryCache::new(&config.cache),
                scorer: ConfidenceScorer::new(config.scoring.clone()),
                assembler: ArcAssembler::new(config.cache.arc_ttl()),
                retry: RetryPolicy::from_config(&config.orchestrator),
                config: config.orchestrator.clone(),
                index: DashMap::new(),
                last_generated: DashMap::new(),
            }),
        }
    }

    pub fn cache(&self) -> &StoryCache {
        &self.inner.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Ranked arcs for a scope.
    pub async fn generate_stories(&self, scope: &Scope) -> ArchiveResult<Vec<NarrativeArc>> {
        Ok(self.generate_report(scope).await?.arcs)
    }

    /// Run every applicable detector for `scope` under the request deadline.
    ///
    /// A detector that times out, fails, or finds nothing is listed in
    /// `omissions` and never affects the others. If the store could not be
    /// reached and no arc was produced, the store error is returned instead.
    pub async fn generate_report(&self, scope: &Scope) -> ArchiveResult<CurationReport> {
        let scope_key = scope.key();
        let request_id = Uuid::new_v4().to_string();
        let span = curation_span!(scope_key, request_id);
        self.generate_report_inner(scope, scope_key, request_id)
            .instrument(span)
            .await
    }

    async fn generate_report_inner(
        &self,
        scope: &Scope,
        scope_key: String,
        request_id: String,
    ) -> ArchiveResult<CurationReport> {
        let deadline = tokio::time::Instant::now() + self.inner.config.deadline();
        let started = Utc::now();

        // The staleness check counts against the request deadline. If it
        // cannot complete, `last_generated` keeps its old value so the next
        // request asks the store again.
        let staleness_checked =
            match tokio::time::timeout_at(deadline, self.refresh_if_stale(scope)).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "staleness check failed; serving cached stories");
                    false
                }
                Err(_) => {
                    tracing::warn!("staleness check hit the request deadline");
                    false
                }
            };

        let snapshot: Snapshot = Arc::new(OnceCell::new());
        let cancel = CancellationToken::new();
        let mut pending: BTreeSet<ArcType> = BTreeSet::new();
        let mut tasks = JoinSet::new();

        for arc_type in ArcType::for_scope(scope) {
            pending.insert(arc_type);
            let inner = Arc::clone(&self.inner);
            tasks.spawn(
                inner
                    .run_detector(arc_type, scope.clone(), Arc::clone(&snapshot), cancel.child_token())
                    .instrument(detector_span!(arc_type)),
            );
        }

        let mut arcs: Vec<NarrativeArc> = Vec::new();
        let mut omissions: Vec<Omission> = Vec::new();
        let mut store_error: Option<ArchiveError> = None;
        let mut timed_out = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((arc_type, outcome)))) => {
                    pending.remove(&arc_type);
                    match outcome {
                        Ok(CachedStory::Story { arc }) => arcs.push(arc),
                        Ok(CachedStory::NoStory { reason, .. }) => omissions.push(Omission {
                            arc_type,
                            reason: OmissionReason::NoArc { detail: reason },
                        }),
                        Err(e) => {
                            let reason = match &e {
                                ArchiveError::MetadataStoreUnavailable { .. } => {
                                    OmissionReason::StoreUnavailable {
                                        detail: e.to_string(),
                                    }
                                }
                                ArchiveError::CurationError(CurationError::Cancelled { .. }) => {
                                    OmissionReason::TimedOut
                                }
                                _ => OmissionReason::Failed {
                                    detail: e.to_string(),
                                },
                            };
                            tracing::warn!(%arc_type, error = %e, "detector produced no arc");
                            if matches!(reason, OmissionReason::StoreUnavailable { .. }) {
                                store_error.get_or_insert(e);
                            }
                            omissions.push(Omission { arc_type, reason });
                        }
                    }
                }
                Ok(Some(Err(join_err))) => {
                    tracing::error!(error = %join_err, "detector task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    cancel.cancel();
                    tasks.abort_all();
                    break;
                }
            }
        }

        for arc_type in pending {
            let reason = if timed_out {
                let err = ArchiveError::DetectorTimeout {
                    arc_type,
                    deadline_ms: self.inner.config.deadline_ms,
                };
                tracing::warn!(error = %err, "detector omitted");
                OmissionReason::TimedOut
            } else {
                OmissionReason::Failed {
                    detail: "detector task aborted".to_string(),
                }
            };
            omissions.push(Omission { arc_type, reason });
        }

        let arcs = rank(arcs);
        for arc in &arcs {
            self.inner.index.insert(arc.id.clone(), arc.clone());
        }
        omissions.sort_by_key(|o| o.arc_type);

        if let Some(err) = store_error {
            if arcs.is_empty() {
                return Err(err);
            }
            tracing::warn!(
                error = %err,
                arc_count = arcs.len(),
                "store unavailable; returning partial stories"
            );
        } else if !timed_out && staleness_checked {
            self.inner
                .last_generated
                .insert(scope_key.clone(), started);
        }

        tracing::info!(
            arc_count = arcs.len(),
            omitted = omissions.len(),
            "curation request complete"
        );

        Ok(CurationReport {
            request_id,
            scope_key,
            arcs,
            omissions,
            generated_at: started,
        })
    }

    /// A previously generated arc by id.
    pub fn get_story(&self, id: &str) -> ArchiveResult<NarrativeArc> {
        let found = self.inner.index.get(id).map(|entry| entry.value().clone());
        match found {
            Some(arc) if !arc.is_expired(Utc::now()) => Ok(arc),
            Some(_) => {
                self.inner.index.remove(id);
                Err(ArchiveError::StoryNotFound { id: id.to_string() })
            }
            None => Err(ArchiveError::StoryNotFound { id: id.to_string() }),
        }
    }

    /// Drop every cached entry and index entry for a scope.
    pub async fn invalidate(&self, scope: &Scope) {
        let scope_key = scope.key();
        let removed = self.inner.cache.invalidate_scope(&scope_key).await;
        for id in &removed {
            self.inner.index.remove(id);
        }
        self.inner.index.retain(|_, arc| arc.scope_key != scope_key);
        self.inner.last_generated.remove(&scope_key);
        tracing::info!(scope_key = %scope_key, removed = removed.len(), "scope invalidated");
    }

    /// Invalidate `scope` if the store reports changes since its last
    /// generation. Returns whether it was invalidated.
    pub async fn refresh_if_stale(&self, scope: &Scope) -> ArchiveResult<bool> {
        let scope_key = scope.key();
        let Some(since) = self
            .inner
            .last_generated
            .get(&scope_key)
            .map(|entry| *entry.value())
        else {
            return Ok(false);
        };

        let store = Arc::clone(&self.inner.store);
        let key = scope_key.clone();
        let changed = self
            .inner
            .retry
            .run(&scope_key, move || store.changed_since(&key, since))
            .await?;
        if changed {
            tracing::info!(scope_key = %scope_key, since = %since, "photos changed; regenerating scope");
            self.invalidate(scope).await;
        }
        Ok(changed)
    }

    /// Serialize the story cache.
    pub fn export_cache(&self) -> ArchiveResult<String> {
        self.inner.cache.export_json()
    }

    /// Warm the story cache and index from an exported snapshot.
    pub async fn import_cache(&self, json: &str) -> ArchiveResult<ImportSummary> {
        let summary = self.inner.cache.import_json(json).await?;
        for arc in self.inner.cache.arcs() {
            self.inner.index.insert(arc.id.clone(), arc);
        }
        Ok(summary)
    }
}

impl EngineInner {
    async fn run_detector(
        self: Arc<Self>,
        arc_type: ArcType,
        scope: Scope,
        snapshot: Snapshot,
        cancel: CancellationToken,
    ) -> (ArcType, ArchiveResult<CachedStory>) {
        let key = StoryKey::new(arc_type, scope.key());
        loop {
            let outcome = self
                .cache
                .get_or_generate(key.clone(), self.generate(arc_type, &scope, &snapshot, &cancel))
                .await;
            match outcome {
                // Another request owned the shared generation and gave up on
                // it. This request still has time, so it generates on its own.
                Err(ArchiveError::CurationError(CurationError::Cancelled { .. }))
                    if !cancel.is_cancelled() =>
                {
                    tracing::debug!("shared generation was cancelled elsewhere; retrying");
                }
                outcome => return (arc_type, outcome),
            }
        }
    }

    async fn generate(
        &self,
        arc_type: ArcType,
        scope: &Scope,
        snapshot: &OnceCell<Result<Arc<Vec<Photo>>, StoreFailure>>,
        cancel: &CancellationToken,
    ) -> ArchiveResult<CachedStory> {
        let cancelled = || -> ArchiveError { CurationError::Cancelled { arc_type }.into() };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let photos = match snapshot.get_or_init(|| self.fetch_snapshot(scope)).await {
            Ok(photos) => Arc::clone(photos),
            Err(failure) => return Err(failure.to_error()),
        };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let detection = {
            let photos = Arc::clone(&photos);
            tokio::task::spawn_blocking(move || detectors::detect(arc_type, &photos)).await
        };
        let now = Utc::now();
        let value = match detection {
            Err(join) => {
                let message = if join.is_panic() {
                    panic_message(join.into_panic())
                } else {
                    join.to_string()
                };
                return Err(CurationError::DetectorPanic { arc_type, message }.into());
            }
            Ok(Err(e @ ArchiveError::InsufficientData { .. })) => {
                tracing::debug!(reason = %e, "no arc");
                self.cache.tombstone(e.to_string(), now)
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(candidate)) => {
                let confidence = self.scorer.score_candidate(&candidate);
                let arc = self
                    .assembler
                    .assemble(&candidate, &photos, scope, confidence, now);
                tracing::debug!(
                    arc_id = %arc.id,
                    photos = arc.photo_ids.len(),
                    confidence,
                    "arc generated"
                );
                CachedStory::Story { arc }
            }
        };

        // Nothing is published once the request has given up on us.
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        Ok(value)
    }

    async fn fetch_snapshot(&self, scope: &Scope) -> Result<Arc<Vec<Photo>>, StoreFailure> {
        let scope_key = scope.key();
        let store = Arc::clone(&self.store);
        let query_scope = scope.clone();
        let photos = self
            .retry
            .run(&scope_key, move || query(store.as_ref(), &query_scope))
            .await
            .map_err(|e| StoreFailure::from_error(&scope_key, e))?;
        tracing::debug!(photo_count = photos.len(), "scope snapshot fetched");
        Ok(Arc::new(photos))
    }
}

fn query(store: &dyn IPhotoStore, scope: &Scope) -> ArchiveResult<Vec<Photo>> {
    match scope {
        Scope::Event { event_id } => store.query_photos_by_event(event_id),
        Scope::Athlete { athlete_id } => store.query_photos_by_athlete(athlete_id),
        Scope::Global => store.query_all_photos(None),
        Scope::Season { .. } => store.query_all_photos(scope.filter().as_ref()),
    }
}

/// Deduplicate by id, then order by confidence descending and arc type.
fn rank(arcs: Vec<NarrativeArc>) -> Vec<NarrativeArc> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<NarrativeArc> = arcs
        .into_iter()
        .filter(|arc| seen.insert(arc.id.clone()))
        .collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.arc_type.cmp(&b.arc_type))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
