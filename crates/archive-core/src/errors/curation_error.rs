use crate::models::ArcType;

/// Detector and orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum CurationError {
    #[error("detector {arc_type} panicked: {message}")]
    DetectorPanic { arc_type: ArcType, message: String },

    #[error("detector {arc_type} was cancelled")]
    Cancelled { arc_type: ArcType },

    /// A shared in-flight generation failed for another waiter.
    #[error("generation of {arc_type} failed: {reason}")]
    GenerationFailed { arc_type: ArcType, reason: String },
}
