//! Tracing setup and span definitions for curation requests.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use archive_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Environment variable holding an `EnvFilter` directive that overrides the
/// configured log level, e.g. `ARCHIVE_LOG=archive_curation=debug`.
pub const LOG_ENV: &str = "ARCHIVE_LOG";

/// Initialize the global tracing subscriber.
///
/// Idempotent; a subscriber installed elsewhere is left in place.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let json = config.json_logs.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
        });
        let plain = (!config.json_logs).then(|| fmt::layer().with_target(true));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(json)
            .with(plain)
            .try_init();
    });
}

/// Create a curation request span.
#[macro_export]
macro_rules! curation_span {
    ($scope_key:expr, $request_id:expr) => {
        tracing::info_span!(
            "archive.curation",
            scope_key = %$scope_key,
            request_id = %$request_id
        )
    };
}

/// Create a detector span.
#[macro_export]
macro_rules! detector_span {
    ($arc_type:expr) => {
        tracing::debug_span!("archive.detector", arc_type = %$arc_type)
    };
}

/// Create a refresh-cycle span.
#[macro_export]
macro_rules! refresh_span {
    ($scope_count:expr) => {
        tracing::info_span!("archive.refresh", scope_count = $scope_count)
    };
}
