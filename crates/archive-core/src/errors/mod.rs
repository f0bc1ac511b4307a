//! Error handling for the curation engine.
//! One error enum per subsystem, `thiserror` only, aggregated into [`ArchiveError`].

mod curation_error;
mod store_error;

pub use curation_error::CurationError;
pub use store_error::StoreError;

use crate::models::ArcType;

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid photo record '{photo_id}': {reason}")]
    InvalidPhotoRecord { photo_id: String, reason: String },

    #[error("insufficient data for {arc_type}: found {found}, required {required}")]
    InsufficientData {
        arc_type: ArcType,
        found: usize,
        required: usize,
    },

    #[error("metadata store unavailable for scope '{scope_key}' after {attempts} attempts: {reason}")]
    MetadataStoreUnavailable {
        scope_key: String,
        attempts: u32,
        reason: String,
    },

    #[error("cache entry '{key}' is corrupted: {reason}")]
    CacheCorruption { key: String, reason: String },

    #[error("detector {arc_type} exceeded the {deadline_ms}ms deadline")]
    DetectorTimeout { arc_type: ArcType, deadline_ms: u64 },

    #[error("story not found: {id}")]
    StoryNotFound { id: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("curation error: {0}")]
    CurationError(#[from] CurationError),
}

impl ArchiveError {
    /// Whether a failed store call may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StoreError(StoreError::Unavailable { .. })
                | Self::StoreError(StoreError::QueryTimeout { .. })
                | Self::StoreError(StoreError::Busy { .. })
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
