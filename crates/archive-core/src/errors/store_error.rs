/// Metadata store adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    #[error("invalid scope key '{scope_key}': {reason}")]
    InvalidScope { scope_key: String, reason: String },

    #[error("store busy: {reason}")]
    Busy { reason: String },
}
