//! Engine configuration, loaded from TOML with compiled defaults.

mod cache_config;
pub mod defaults;
mod observability_config;
mod orchestrator_config;
mod scoring_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache_config::CacheConfig;
pub use observability_config::ObservabilityConfig;
pub use orchestrator_config::OrchestratorConfig;
pub use scoring_config::{ScoringConfig, ScoringWeights};

use crate::errors::{ArchiveError, ArchiveResult};
use crate::models::{ArcType, Scope};

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`ARCHIVE_*`)
/// 2. TOML file or string
/// 3. Compiled defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub scoring: ScoringConfig,
    pub cache: CacheConfig,
    pub orchestrator: OrchestratorConfig,
    pub observability: ObservabilityConfig,
}

impl ArchiveConfig {
    /// Load configuration from a TOML string. Missing sections use defaults.
    pub fn from_toml(toml_str: &str) -> ArchiveResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ArchiveError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply `ARCHIVE_*` environment overrides.
    pub fn load(path: &Path) -> ArchiveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ArchiveError::ConfigError(format!("{}: {e}", path.display())))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    ///
    /// Recognized: `ARCHIVE_LOG_LEVEL`, `ARCHIVE_JSON_LOGS`, `ARCHIVE_DEADLINE_MS`,
    /// `ARCHIVE_ARC_TTL_SECS`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ArchiveResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ARCHIVE_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(json) = lookup("ARCHIVE_JSON_LOGS") {
            self.observability.json_logs = parse_env("ARCHIVE_JSON_LOGS", &json)?;
        }
        if let Some(ms) = lookup("ARCHIVE_DEADLINE_MS") {
            self.orchestrator.deadline_ms = parse_env("ARCHIVE_DEADLINE_MS", &ms)?;
        }
        if let Some(secs) = lookup("ARCHIVE_ARC_TTL_SECS") {
            self.cache.arc_ttl_secs = parse_env("ARCHIVE_ARC_TTL_SECS", &secs)?;
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> ArchiveResult<()> {
        for arc_type in ArcType::ALL {
            let w = self.scoring.weights(arc_type);
            let coefficients = [w.base, w.count_weight, w.quality_weight];
            if coefficients.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(ArchiveError::ConfigError(format!(
                    "scoring.{}: coefficients must be finite and non-negative",
                    arc_type.as_str().replace('-', "_")
                )));
            }
            if w.count_span == 0 {
                return Err(ArchiveError::ConfigError(format!(
                    "scoring.{}: count_span must be greater than 0",
                    arc_type.as_str().replace('-', "_")
                )));
            }
        }
        if self.cache.arc_ttl_secs == 0 || self.cache.tombstone_ttl_secs == 0 {
            return Err(ArchiveError::ConfigError(
                "cache TTLs must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator.deadline_ms == 0 {
            return Err(ArchiveError::ConfigError(
                "orchestrator.deadline_ms must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator.refresh_interval_secs == 0 {
            return Err(ArchiveError::ConfigError(
                "orchestrator.refresh_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator.max_backoff_ms < self.orchestrator.initial_backoff_ms {
            return Err(ArchiveError::ConfigError(
                "orchestrator.max_backoff_ms must be >= initial_backoff_ms".to_string(),
            ));
        }
        for key in &self.orchestrator.refresh_scopes {
            key.parse::<Scope>().map_err(|e| {
                ArchiveError::ConfigError(format!("orchestrator.refresh_scopes: {e}"))
            })?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> ArchiveResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ArchiveError::ConfigError(format!("{name}: invalid value '{value}'")))
}
