//! Store access with per-attempt timeout and exponential backoff.
//!
//! Store adapters are synchronous, so every attempt runs on the blocking pool.

use std::time::Duration;

use archive_core::config::OrchestratorConfig;
use archive_core::errors::{ArchiveError, ArchiveResult, StoreError};

/// Retry policy for metadata store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Timeout of a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            timeout: config.store_timeout(),
            max_retries: config.store_max_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }

    /// Backoff slept before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `query` until it succeeds, fails permanently, or retries run out.
    ///
    /// Any failure is reported as `MetadataStoreUnavailable` for `scope_key`.
    /// Timeouts and transient store errors are retried; anything else fails
    /// on the spot.
    pub async fn run<T, F>(&self, scope_key: &str, query: F) -> ArchiveResult<T>
    where
        T: Send + 'static,
        F: Fn() -> ArchiveResult<T> + Clone + Send + 'static,
    {
        let mut last_err = String::new();
        let mut attempts = 0;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_for(attempt);
                tracing::debug!(
                    scope_key,
                    attempt,
                    max_retries = self.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "store: retrying query"
                );
                tokio::time::sleep(backoff).await;
            }
            attempts += 1;

            let outcome =
                tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(query.clone())).await;
            let err = match outcome {
                Ok(Ok(Ok(value))) => return Ok(value),
                Ok(Ok(Err(e))) => e,
                Ok(Err(join)) => StoreError::Unavailable {
                    reason: format!("query task failed: {join}"),
                }
                .into(),
                Err(_) => StoreError::QueryTimeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .into(),
            };

            last_err = err.to_string();
            if !err.is_transient() {
                break;
            }
        }

        tracing::warn!(scope_key, attempts, error = %last_err, "store: query failed");
        Err(ArchiveError::MetadataStoreUnavailable {
            scope_key: scope_key.to_string(),
            attempts,
            reason: last_err,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&OrchestratorConfig::default())
    }
}
