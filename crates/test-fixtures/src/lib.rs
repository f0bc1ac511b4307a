//! Test fixture loader and photo builders shared by the workspace's tests.
//!
//! Fixture JSON files live under `crates/test-fixtures/photos/` and hold arrays
//! of raw pipeline records, including deliberately malformed ones.

use std::path::PathBuf;

use archive_core::models::{
    ActionIntensity, Emotion, Photo, PlayType, RawPhotoRecord, TimeInGame,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::de::DeserializeOwned;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find test-fixtures.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    if path.ends_with("test-fixtures") {
        return path;
    }
    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw pipeline records.
pub fn load_records(relative_path: &str) -> Vec<RawPhotoRecord> {
    load_fixture(relative_path)
}

/// Read a fixture file as a string.
pub fn load_fixture_text(relative_path: &str) -> String {
    let path = fixture_path(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Reference capture time all builders offset from: 2024-05-04T18:00:00Z.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0)
        .single()
        .expect("valid base time")
}

/// Fluent builder for typed photos with neutral defaults.
#[derive(Debug, Clone)]
pub struct PhotoBuilder {
    photo: Photo,
}

impl PhotoBuilder {
    /// A mid-quality, medium-intensity, `focus` photo captured at [`base_time`].
    pub fn new(id: &str, event_id: &str) -> Self {
        Self {
            photo: Photo {
                id: id.to_string(),
                event_id: event_id.to_string(),
                athlete_id: None,
                captured_at: base_time(),
                play_type: None,
                action_intensity: ActionIntensity::Medium,
                emotion: Emotion::Focus,
                sharpness: 5.0,
                composition_score: 5.0,
                emotional_impact: 5.0,
                time_in_game: None,
            },
        }
    }

    pub fn athlete(mut self, athlete_id: &str) -> Self {
        self.photo.athlete_id = Some(athlete_id.to_string());
        self
    }

    /// Capture time as minutes after [`base_time`].
    pub fn at_minute(mut self, minute: i64) -> Self {
        self.photo.captured_at = base_time() + Duration::minutes(minute);
        self
    }

    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.photo.captured_at = at;
        self
    }

    pub fn play(mut self, play: PlayType) -> Self {
        self.photo.play_type = Some(play);
        self
    }

    pub fn intensity(mut self, intensity: ActionIntensity) -> Self {
        self.photo.action_intensity = intensity;
        self
    }

    pub fn emotion(mut self, emotion: Emotion) -> Self {
        self.photo.emotion = emotion;
        self
    }

    pub fn scores(mut self, sharpness: f64, composition: f64) -> Self {
        self.photo.sharpness = sharpness;
        self.photo.composition_score = composition;
        self
    }

    pub fn impact(mut self, impact: f64) -> Self {
        self.photo.emotional_impact = impact;
        self
    }

    pub fn time_in_game(mut self, time: TimeInGame) -> Self {
        self.photo.time_in_game = Some(time);
        self
    }

    pub fn build(self) -> Photo {
        self.photo
    }
}

/// A final-phase, peak-intensity `triumph` photo: qualifies for a Game-Winning Rally.
pub fn rally_photo(id: &str, event_id: &str, minute: i64) -> Photo {
    PhotoBuilder::new(id, event_id)
        .at_minute(minute)
        .time_in_game(TimeInGame::Final)
        .intensity(ActionIntensity::Peak)
        .emotion(Emotion::Triumph)
        .impact(8.0)
        .build()
}

/// A photo that qualifies for Technical Excellence and Player Highlight Reel.
pub fn sharp_photo(id: &str, event_id: &str, athlete_id: &str, composition: f64) -> Photo {
    PhotoBuilder::new(id, event_id)
        .athlete(athlete_id)
        .scores(9.5, composition)
        .build()
}
