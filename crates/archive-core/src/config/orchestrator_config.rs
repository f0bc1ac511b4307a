use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Curation orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Per-request deadline covering every detector (milliseconds).
    pub deadline_ms: u64,
    /// Timeout of a single store query attempt (milliseconds).
    pub store_timeout_ms: u64,
    /// Retries after the first failed store query.
    pub store_max_retries: u32,
    /// Initial retry backoff, doubled each retry (milliseconds).
    pub initial_backoff_ms: u64,
    /// Backoff cap (milliseconds).
    pub max_backoff_ms: u64,
    /// Interval of the scheduled refresh job (seconds).
    pub refresh_interval_secs: u64,
    /// Scope keys the refresh job keeps warm, e.g. `["global", "event:E1"]`.
    pub refresh_scopes: Vec<String>,
}

impl OrchestratorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            deadline_ms: defaults::DEFAULT_DEADLINE_MS,
            store_timeout_ms: defaults::DEFAULT_STORE_TIMEOUT_MS,
            store_max_retries: defaults::DEFAULT_STORE_MAX_RETRIES,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
            refresh_interval_secs: defaults::DEFAULT_REFRESH_INTERVAL_SECS,
            refresh_scopes: Vec::new(),
        }
    }
}
