use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use archive_core::config::ArchiveConfig;
use archive_core::errors::{ArchiveError, ArchiveResult, StoreError};
use archive_core::models::{ArcType, Emotion, Photo, PhotoFilter, Scope};
use archive_core::traits::IPhotoStore;
use archive_curation::{CurationEngine, OmissionReason};
use archive_storage::InMemoryPhotoStore;
use test_fixtures::{load_records, rally_photo, PhotoBuilder};

// ── Instrumented store ────────────────────────────────────────────────────

/// Wraps an in-memory store with a query counter, latency, and failures.
struct InstrumentedStore {
    inner: InMemoryPhotoStore,
    queries: AtomicUsize,
    delay: Duration,
    transient_failures: AtomicUsize,
    down: bool,
    change_delay: Duration,
    changes_down: AtomicBool,
}

impl InstrumentedStore {
    fn new(inner: InMemoryPhotoStore) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            delay: Duration::ZERO,
            transient_failures: AtomicUsize::new(0),
            down: false,
            change_delay: Duration::ZERO,
            changes_down: AtomicBool::new(false),
        }
    }

    fn scenario_a() -> Self {
        Self::new(InMemoryPhotoStore::from_records(load_records(
            "photos/scenario_a_event_e1.json",
        )))
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_first(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    fn down(mut self) -> Self {
        self.down = true;
        self
    }

    fn with_change_delay(mut self, delay: Duration) -> Self {
        self.change_delay = delay;
        self
    }

    fn set_changes_down(&self, down: bool) {
        self.changes_down.store(down, Ordering::SeqCst);
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ArchiveResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.down {
            return Err(StoreError::Unavailable {
                reason: "connection refused".into(),
            }
            .into());
        }
        let fail = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(StoreError::Busy {
                reason: "database is locked".into(),
            }
            .into());
        }
        Ok(())
    }
}

impl IPhotoStore for InstrumentedStore {
    fn query_photos_by_event(&self, event_id: &str) -> ArchiveResult<Vec<Photo>> {
        self.enter()?;
        self.inner.query_photos_by_event(event_id)
    }

    fn query_photos_by_athlete(&self, athlete_id: &str) -> ArchiveResult<Vec<Photo>> {
        self.enter()?;
        self.inner.query_photos_by_athlete(athlete_id)
    }

    fn query_all_photos(&self, filter: Option<&PhotoFilter>) -> ArchiveResult<Vec<Photo>> {
        self.enter()?;
        self.inner.query_all_photos(filter)
    }

    fn changed_since(&self, scope_key: &str, since: DateTime<Utc>) -> ArchiveResult<bool> {
        if !self.change_delay.is_zero() {
            std::thread::sleep(self.change_delay);
        }
        if self.changes_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "change log unreachable".into(),
            }
            .into());
        }
        self.inner.changed_since(scope_key, since)
    }
}

fn test_config() -> ArchiveConfig {
    let mut config = ArchiveConfig::default();
    config.orchestrator.store_timeout_ms = 1_000;
    config.orchestrator.initial_backoff_ms = 1;
    config.orchestrator.max_backoff_ms = 5;
    config
}

fn e1() -> Scope {
    Scope::event("E1")
}

// ── Scenario A through the engine ─────────────────────────────────────────

#[tokio::test]
async fn scenario_a_returns_the_rally() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store.clone(), &test_config());

    let arcs = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(arcs.len(), 1);
    assert_eq!(arcs[0].arc_type, ArcType::GameWinningRally);
    assert_eq!(arcs[0].photo_ids, vec!["e1-p1", "e1-p2", "e1-p3"]);
    assert!(arcs[0].curve_matches_photos());
}

#[tokio::test]
async fn report_lists_detectors_that_found_nothing() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store, &test_config());

    let report = engine.generate_report(&e1()).await.unwrap();
    let omitted: Vec<ArcType> = report.omissions.iter().map(|o| o.arc_type).collect();
    assert_eq!(
        omitted,
        vec![
            ArcType::ComebackStory,
            ArcType::TechnicalExcellence,
            ArcType::EmotionSpectrum
        ]
    );
    assert!(report
        .omissions
        .iter()
        .all(|o| matches!(o.reason, OmissionReason::NoArc { .. })));
    assert_eq!(report.scope_key, "event:E1");
}

#[tokio::test]
async fn athlete_scope_runs_only_the_highlight_reel() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store, &test_config());

    let report = engine.generate_report(&Scope::athlete("A1")).await.unwrap();
    assert!(report.arcs.is_empty());
    assert_eq!(report.omissions.len(), 1);
    assert_eq!(report.omissions[0].arc_type, ArcType::PlayerHighlightReel);
}

#[tokio::test]
async fn global_scope_finds_the_season_journey() {
    let store = Arc::new(InMemoryPhotoStore::from_records(load_records(
        "photos/season_collection.json",
    )));
    let engine = CurationEngine::new(store, &test_config());

    let arcs = engine.generate_stories(&Scope::Global).await.unwrap();
    assert_eq!(arcs.len(), 1);
    assert_eq!(arcs[0].arc_type, ArcType::SeasonJourney);
    assert_eq!(arcs[0].photo_ids.len(), 9);
}

// ── Caching and single-flight ─────────────────────────────────────────────

#[tokio::test]
async fn snapshot_is_fetched_once_per_request_and_cached_after() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store.clone(), &test_config());

    engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(store.queries(), 1);
    assert_eq!(engine.cache().misses(), 4);

    let again = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(store.queries(), 1, "second request must be served from cache");
    assert_eq!(engine.cache().hits(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_generation_per_detector() {
    let store = Arc::new(InstrumentedStore::scenario_a().with_delay(Duration::from_millis(50)));
    let engine = CurationEngine::new(store.clone(), &test_config());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.generate_stories(&Scope::event("E1")).await
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(engine.cache().misses(), 4);
    assert!(store.queries() <= 4);
    let first_ids: Vec<&str> = results[0].iter().map(|a| a.id.as_str()).collect();
    for arcs in &results {
        let ids: Vec<&str> = arcs.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, first_ids);
    }
}

#[tokio::test]
async fn regeneration_of_unchanged_scope_is_identical() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store.clone(), &test_config());

    let first = engine.generate_stories(&e1()).await.unwrap();
    engine.invalidate(&e1()).await;
    let second = engine.generate_stories(&e1()).await.unwrap();

    assert_eq!(store.queries(), 2);
    assert_eq!(first[0].id, second[0].id);
    assert_eq!(first[0].photo_ids, second[0].photo_ids);
    assert_eq!(first[0].confidence, second[0].confidence);
}

// ── Scenario D: invalidation after a photo update ─────────────────────────

#[tokio::test]
async fn scenario_d_explicit_invalidation_recomputes() {
    let store = Arc::new(InMemoryPhotoStore::from_records(load_records(
        "photos/scenario_a_event_e1.json",
    )));
    let engine = CurationEngine::new(store.clone(), &test_config());

    let before = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(before[0].photo_ids.len(), 3);

    let mut late = rally_photo("e1-p4", "E1", 0);
    late.captured_at = last_capture(&store) + chrono::Duration::minutes(2);
    store.upsert(late).unwrap();
    engine.invalidate(&e1()).await;

    let misses_before = engine.cache().misses();
    let after = engine.generate_stories(&e1()).await.unwrap();
    assert!(engine.cache().misses() > misses_before);
    assert_eq!(after[0].photo_ids.last().map(String::as_str), Some("e1-p4"));
    assert_ne!(before[0].id, after[0].id);
}

#[tokio::test]
async fn scenario_d_store_reported_change_triggers_recompute() {
    let store = Arc::new(InMemoryPhotoStore::from_records(load_records(
        "photos/scenario_a_event_e1.json",
    )));
    let engine = CurationEngine::new(store.clone(), &test_config());

    engine.generate_stories(&e1()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.remove("e1-p1");

    assert!(engine.refresh_if_stale(&e1()).await.unwrap());
    let after = engine.generate_stories(&e1()).await.unwrap();
    assert!(after.is_empty(), "two rally photos are below the minimum");
}

#[tokio::test]
async fn unrelated_changes_keep_the_cache() {
    let store = Arc::new(InMemoryPhotoStore::from_records(load_records(
        "photos/scenario_a_event_e1.json",
    )));
    let engine = CurationEngine::new(store.clone(), &test_config());

    engine.generate_stories(&e1()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store
        .upsert(PhotoBuilder::new("e9-x", "E9").emotion(Emotion::Serenity).build())
        .unwrap();

    assert!(!engine.refresh_if_stale(&e1()).await.unwrap());
}

#[tokio::test]
async fn failed_staleness_check_does_not_forget_changes() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store.clone(), &test_config());

    let before = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(before[0].photo_ids.len(), 3);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut late = rally_photo("e1-p4", "E1", 0);
    late.captured_at = last_capture(&store.inner) + chrono::Duration::minutes(2);
    store.inner.upsert(late).unwrap();

    // The change log is unreachable: cached stories are served as they are.
    store.set_changes_down(true);
    let during = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(during[0].photo_ids.len(), 3);

    // Once it is back, the change made before the outage is still seen.
    store.set_changes_down(false);
    let after = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(after[0].photo_ids.len(), 4);
    assert_eq!(after[0].photo_ids.last().map(String::as_str), Some("e1-p4"));
}

fn last_capture(store: &InMemoryPhotoStore) -> DateTime<Utc> {
    store
        .query_photos_by_event("E1")
        .unwrap()
        .iter()
        .map(|p| p.captured_at)
        .max()
        .unwrap()
}

// ── get_story ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_story_finds_generated_arcs() {
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store, &test_config());

    let arcs = engine.generate_stories(&e1()).await.unwrap();
    let found = engine.get_story(&arcs[0].id).unwrap();
    assert_eq!(found, arcs[0]);

    assert!(matches!(
        engine.get_story("game-winning-rally-0000000000000000"),
        Err(ArchiveError::StoryNotFound { .. })
    ));

    engine.invalidate(&e1()).await;
    assert!(matches!(
        engine.get_story(&arcs[0].id),
        Err(ArchiveError::StoryNotFound { .. })
    ));
}

#[tokio::test]
async fn get_story_rejects_expired_arcs() {
    let mut config = test_config();
    config.cache.arc_ttl_secs = 1;
    let store = Arc::new(InstrumentedStore::scenario_a());
    let engine = CurationEngine::new(store, &config);

    let arcs = engine.generate_stories(&e1()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(matches!(
        engine.get_story(&arcs[0].id),
        Err(ArchiveError::StoryNotFound { .. })
    ));
}

// ── Deadline, retry, unavailability ───────────────────────────────────────

#[tokio::test]
async fn slow_store_yields_timeouts_not_an_aborted_call() {
    let mut config = test_config();
    config.orchestrator.deadline_ms = 50;
    let store = Arc::new(InstrumentedStore::scenario_a().with_delay(Duration::from_millis(400)));
    let engine = CurationEngine::new(store, &config);

    let report = engine.generate_report(&e1()).await.unwrap();
    assert!(report.arcs.is_empty());
    assert_eq!(report.omissions.len(), 4);
    assert!(report
        .omissions
        .iter()
        .all(|o| o.reason == OmissionReason::TimedOut));
}

#[tokio::test]
async fn slow_staleness_check_stays_within_the_deadline() {
    let mut config = test_config();
    config.orchestrator.deadline_ms = 300;
    config.orchestrator.store_timeout_ms = 500;
    let store = Arc::new(
        InstrumentedStore::scenario_a().with_change_delay(Duration::from_millis(600)),
    );
    let engine = CurationEngine::new(store, &config);

    // First request has nothing to check yet.
    engine.generate_stories(&e1()).await.unwrap();

    let started = std::time::Instant::now();
    let report = engine.generate_report(&e1()).await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(500),
        "request took {elapsed:?} with a 300ms deadline"
    );
    assert!(report
        .omissions
        .iter()
        .all(|o| o.reason == OmissionReason::TimedOut));
}

#[tokio::test]
async fn transient_store_failures_are_retried() {
    let store = Arc::new(InstrumentedStore::scenario_a().failing_first(2));
    let engine = CurationEngine::new(store.clone(), &test_config());

    let arcs = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(arcs.len(), 1);
    assert_eq!(store.queries(), 3);
}

#[tokio::test]
async fn unavailable_store_with_no_arcs_is_an_error() {
    let store = Arc::new(InstrumentedStore::scenario_a().down());
    let engine = CurationEngine::new(store.clone(), &test_config());

    let err = engine.generate_stories(&e1()).await.unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::MetadataStoreUnavailable { ref scope_key, .. } if scope_key == "event:E1"
    ));
    // One fetch with its retries serves every detector of the request.
    let queries = store.queries();
    assert_eq!(queries, 4);
    // Failures are not cached: the next request tries the store again.
    assert!(engine.generate_stories(&e1()).await.is_err());
    assert!(store.queries() > queries);
}

#[tokio::test]
async fn unavailable_store_with_cached_arcs_returns_partial_results() {
    let healthy = CurationEngine::new(
        Arc::new(InstrumentedStore::scenario_a()),
        &test_config(),
    );
    healthy.generate_stories(&e1()).await.unwrap();

    // Keep only the rally entry so the other detectors must hit the store.
    let mut snapshot: serde_json::Value =
        serde_json::from_str(&healthy.export_cache().unwrap()).unwrap();
    snapshot["entries"]
        .as_array_mut()
        .unwrap()
        .retain(|e| e["key"]["arcType"] == "game-winning-rally");

    let degraded = CurationEngine::new(
        Arc::new(InstrumentedStore::scenario_a().down()),
        &test_config(),
    );
    let summary = degraded.import_cache(&snapshot.to_string()).await.unwrap();
    assert_eq!(summary.loaded, 1);

    let report = degraded.generate_report(&e1()).await.unwrap();
    assert_eq!(report.arcs.len(), 1);
    assert_eq!(report.omissions.len(), 3);
    assert!(report
        .omissions
        .iter()
        .all(|o| matches!(o.reason, OmissionReason::StoreUnavailable { .. })));
    assert!(degraded.get_story(&report.arcs[0].id).is_ok());
}

// ── Ranking ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn arcs_are_ranked_by_confidence() {
    let emotions = [
        Emotion::Focus,
        Emotion::Determination,
        Emotion::Excitement,
        Emotion::Intensity,
        Emotion::Serenity,
    ];
    let mut photos: Vec<Photo> = emotions
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            PhotoBuilder::new(&format!("m{i}"), "E3")
                .at_minute(i as i64)
                .emotion(e)
                .build()
        })
        .collect();
    photos.extend((0..3).map(|i| rally_photo(&format!("r{i}"), "E3", 100 + i)));
    let store = Arc::new(InMemoryPhotoStore::from_photos(photos));
    let engine = CurationEngine::new(store, &test_config());

    let arcs = engine.generate_stories(&Scope::event("E3")).await.unwrap();
    let types: Vec<ArcType> = arcs.iter().map(|a| a.arc_type).collect();
    assert!(types.contains(&ArcType::GameWinningRally));
    assert!(types.contains(&ArcType::ComebackStory));
    assert!(types.contains(&ArcType::EmotionSpectrum));
    assert!(arcs.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

// ── SQLite-backed end to end ──────────────────────────────────────────────

#[tokio::test]
async fn sqlite_store_drives_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        Arc::new(archive_storage::SqlitePhotoStore::open(&dir.path().join("archive.db")).unwrap());
    for record in load_records("photos/scenario_a_event_e1.json") {
        store.insert_raw(&record).unwrap();
    }
    let engine = CurationEngine::new(store.clone(), &test_config());

    let arcs = engine.generate_stories(&e1()).await.unwrap();
    assert_eq!(arcs.len(), 1);
    assert_eq!(arcs[0].photo_ids, vec!["e1-p1", "e1-p2", "e1-p3"]);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(store.remove("e1-p2").unwrap());
    assert!(engine.generate_stories(&e1()).await.unwrap().is_empty());
}
