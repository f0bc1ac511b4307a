use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Story cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a generated arc (seconds).
    pub arc_ttl_secs: u64,
    /// Lifetime of a "no arc" tombstone (seconds).
    pub tombstone_ttl_secs: u64,
    /// Maximum cached (type, scope) entries.
    pub max_entries: u64,
}

impl CacheConfig {
    pub fn arc_ttl(&self) -> Duration {
        Duration::from_secs(self.arc_ttl_secs)
    }

    pub fn tombstone_ttl(&self) -> Duration {
        Duration::from_secs(self.tombstone_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            arc_ttl_secs: defaults::DEFAULT_ARC_TTL_SECS,
            tombstone_ttl_secs: defaults::DEFAULT_TOMBSTONE_TTL_SECS,
            max_entries: defaults::DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}
