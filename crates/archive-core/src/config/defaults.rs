// Single source of truth for all default values.

// --- Cache ---
pub const DEFAULT_ARC_TTL_SECS: u64 = 86_400; // daily
pub const DEFAULT_TOMBSTONE_TTL_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

// --- Orchestrator ---
pub const DEFAULT_DEADLINE_MS: u64 = 3_000;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_STORE_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 86_400;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;

// --- Scoring: (base, count_weight, quality_weight, count_span) ---
// Ceilings (base + both weights) keep the reference values 0.9 / 0.85 / 0.8.
pub const DEFAULT_RALLY_WEIGHTS: (f64, f64, f64, usize) = (0.5, 0.2, 0.2, 5);
pub const DEFAULT_HIGHLIGHT_WEIGHTS: (f64, f64, f64, usize) = (0.45, 0.15, 0.25, 5);
pub const DEFAULT_SEASON_WEIGHTS: (f64, f64, f64, usize) = (0.5, 0.3, 0.0, 8);
pub const DEFAULT_COMEBACK_WEIGHTS: (f64, f64, f64, usize) = (0.4, 0.15, 0.3, 6);
pub const DEFAULT_TECHNICAL_WEIGHTS: (f64, f64, f64, usize) = (0.45, 0.15, 0.3, 8);
pub const DEFAULT_SPECTRUM_WEIGHTS: (f64, f64, f64, usize) = (0.3, 0.1, 0.5, 2);
