//! # archive-core
//!
//! Foundation crate for the story curation engine.
//! Defines the photo and narrative-arc models, the store adapter trait,
//! errors, config, and constants. Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::ArchiveConfig;
pub use errors::{ArchiveError, ArchiveResult};
pub use models::{
    ActionIntensity, ArcType, EmotionalPoint, Emotion, NarrativeArc, Photo, PhotoFilter, PlayType,
    RawPhotoRecord, Scope, TimeInGame,
};
pub use traits::IPhotoStore;
