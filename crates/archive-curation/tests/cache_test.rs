use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use archive_core::config::CacheConfig;
use archive_core::models::{ArcType, Scope};
use archive_curation::detectors;
use archive_curation::{ArcAssembler, CachedStory, ConfidenceScorer, StoryCache, StoryKey};
use test_fixtures::rally_photo;

fn rally_story() -> CachedStory {
    let photos: Vec<_> = (0..3).map(|i| rally_photo(&format!("p{i}"), "E1", i)).collect();
    let candidate = detectors::detect(ArcType::GameWinningRally, &photos).unwrap();
    let confidence = ConfidenceScorer::default().score_candidate(&candidate);
    let arc = ArcAssembler::new(Duration::from_secs(3_600)).assemble(
        &candidate,
        &photos,
        &Scope::event("E1"),
        confidence,
        Utc::now(),
    );
    CachedStory::Story { arc }
}

fn rally_key() -> StoryKey {
    StoryKey::new(ArcType::GameWinningRally, "event:E1")
}

#[tokio::test]
async fn export_then_import_restores_entries() {
    let source = StoryCache::new(&CacheConfig::default());
    source.insert(rally_key(), rally_story()).await;
    let tombstone = source.tombstone("nothing found", Utc::now());
    source
        .insert(StoryKey::new(ArcType::EmotionSpectrum, "event:E1"), tombstone)
        .await;

    let json = source.export_json().unwrap();

    let target = StoryCache::new(&CacheConfig::default());
    let summary = target.import_json(&json).await.unwrap();
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.corrupted, 0);
    assert_eq!(target.peek(&rally_key()).await, source.peek(&rally_key()).await);
    assert_eq!(target.arcs().len(), 1);
}

#[tokio::test]
async fn corrupted_entries_are_skipped_and_counted() {
    let story = rally_story();
    let snapshot = json!({
        "version": 1,
        "entries": [
            { "key": { "arcType": "game-winning-rally", "scopeKey": "event:E1" }, "value": story },
            { "key": { "arcType": "not-a-detector", "scopeKey": "event:E1" }, "value": story },
            { "key": { "arcType": "comeback-story", "scopeKey": "event:E1" },
              "value": { "state": "story", "arc": { "id": 42 } } },
            "garbage"
        ]
    });

    let cache = StoryCache::new(&CacheConfig::default());
    let summary = cache.import_json(&snapshot.to_string()).await.unwrap();
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.corrupted, 3);
    assert!(cache
        .peek(&StoryKey::new(ArcType::ComebackStory, "event:E1"))
        .await
        .is_none());
}

#[tokio::test]
async fn entry_under_the_wrong_key_is_corrupted() {
    let snapshot = json!({
        "version": 1,
        "entries": [
            { "key": { "arcType": "game-winning-rally", "scopeKey": "event:E7" }, "value": rally_story() }
        ]
    });
    let cache = StoryCache::new(&CacheConfig::default());
    let summary = cache.import_json(&snapshot.to_string()).await.unwrap();
    assert_eq!(summary.corrupted, 1);
    assert_eq!(summary.loaded, 0);
}

#[tokio::test]
async fn expired_entries_are_dropped_on_import() {
    let stale = Utc::now() - chrono::Duration::hours(1);
    let snapshot = json!({
        "version": 1,
        "entries": [
            { "key": { "arcType": "season-journey", "scopeKey": "global" },
              "value": { "state": "noStory", "reason": "none", "expiresAt": stale } }
        ]
    });
    let cache = StoryCache::new(&CacheConfig::default());
    let summary = cache.import_json(&snapshot.to_string()).await.unwrap();
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.loaded, 0);
}

#[tokio::test]
async fn unparseable_document_is_an_error() {
    let cache = StoryCache::new(&CacheConfig::default());
    assert!(cache.import_json("{ not json").await.is_err());
}

#[tokio::test]
async fn invalidate_scope_returns_removed_arc_ids() {
    let cache = StoryCache::new(&CacheConfig::default());
    let story = rally_story();
    let id = story.arc().map(|a| a.id.clone()).unwrap();
    cache.insert(rally_key(), story).await;
    let tombstone = cache.tombstone("none", Utc::now());
    cache
        .insert(StoryKey::new(ArcType::ComebackStory, "event:E1"), tombstone)
        .await;
    cache
        .insert(StoryKey::new(ArcType::GameWinningRally, "event:E2"), rally_story())
        .await;

    let removed = cache.invalidate_scope("event:E1").await;
    assert_eq!(removed, vec![id]);
    assert!(cache.peek(&rally_key()).await.is_none());
    assert!(cache
        .peek(&StoryKey::new(ArcType::GameWinningRally, "event:E2"))
        .await
        .is_some());
}

#[tokio::test]
async fn tombstones_expire_before_arcs() {
    let cache = StoryCache::new(&CacheConfig {
        arc_ttl_secs: 3_600,
        tombstone_ttl_secs: 1,
        max_entries: 100,
    });
    let tombstone = cache.tombstone("none", Utc::now());
    let key = StoryKey::new(ArcType::EmotionSpectrum, "event:E1");
    cache.insert(key.clone(), tombstone).await;
    cache.insert(rally_key(), rally_story()).await;

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert!(cache.peek(&key).await.is_none());
    assert!(cache.peek(&rally_key()).await.is_some());
}
