//! # archive-curation
//!
//! Detects narrative arcs in a scoped photo collection, scores them, and
//! serves them through a single-flight story cache.
//!
//! ## 6 Detectors
//!
//! | Detector | Pattern | Minimum |
//! |----------|---------|---------|
//! | Game-Winning Rally | Final-phase, high/peak, triumph/intensity photos of one event | 3 photos |
//! | Player Highlight Reel | An athlete's sharp, well-composed photos (top 10) | 5 photos |
//! | Season Journey | One representative photo per event, in event order | 8 events |
//! | Comeback Story | determination → intensity → triumph within one event | 4 photos |
//! | Technical Excellence | Sharpness and composition both ≥ 9 | 8 photos |
//! | Emotion Spectrum | Breadth of emotions within one event | 4 emotions |
//!
//! ## Request Flow
//!
//! The [`CurationEngine`] checks staleness with the store, then runs every
//! applicable detector in its own task under a per-request deadline. Each
//! detector goes through the [`StoryCache`]: a hit is served directly, a miss
//! fetches the scope snapshot (once per request), detects, scores, and
//! assembles. Results are ranked by confidence, then by arc type.

pub mod assembler;
pub mod cache;
pub mod detectors;
pub mod engine;
pub mod observability;
pub mod refresh;
pub mod retry;
pub mod scorer;

pub use assembler::ArcAssembler;
pub use cache::{CachedStory, ImportSummary, StoryCache, StoryKey};
pub use detectors::CandidateArc;
pub use engine::{CurationEngine, CurationReport, Omission, OmissionReason};
pub use refresh::RefreshHandle;
pub use retry::RetryPolicy;
pub use scorer::ConfidenceScorer;
