/// Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum qualifying photos for a Game-Winning Rally.
pub const RALLY_MIN_PHOTOS: usize = 3;

/// Minimum qualifying photos for a Player Highlight Reel.
pub const HIGHLIGHT_MIN_PHOTOS: usize = 5;
/// A highlight reel keeps at most this many photos.
pub const HIGHLIGHT_MAX_PHOTOS: usize = 10;
pub const HIGHLIGHT_MIN_SHARPNESS: f64 = 8.0;
pub const HIGHLIGHT_MIN_COMPOSITION: f64 = 7.0;

/// Minimum distinct events for a Season Journey.
pub const SEASON_MIN_EVENTS: usize = 8;

/// Minimum photos spanning a Comeback Story.
pub const COMEBACK_MIN_PHOTOS: usize = 4;

/// Minimum qualifying photos for Technical Excellence.
pub const TECHNICAL_MIN_PHOTOS: usize = 8;
pub const TECHNICAL_MIN_SHARPNESS: f64 = 9.0;
pub const TECHNICAL_MIN_COMPOSITION: f64 = 9.0;

/// Minimum distinct emotions for an Emotion Spectrum.
pub const SPECTRUM_MIN_EMOTIONS: usize = 4;

/// Upper bound of every 0–10 photo score.
pub const MAX_PHOTO_SCORE: f64 = 10.0;

/// Scope key used for the whole collection.
pub const GLOBAL_SCOPE_KEY: &str = "global";
