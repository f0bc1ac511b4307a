//! Scheduled refresh: keeps a configured list of scopes warm.
//!
//! Each tick runs a full curation request per scope. The request's own
//! staleness check invalidates scopes whose photos changed, and the
//! single-flight cache regenerates only what is missing.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use archive_core::errors::{ArchiveError, ArchiveResult};
use archive_core::models::Scope;

use crate::engine::CurationEngine;
use crate::refresh_span;

/// Handle to a running refresh job.
pub struct RefreshHandle {
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    /// Request shutdown and wait for the current cycle to finish.
    pub async fn stop(self) {
        self.cancellation_token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "refresh job ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl CurationEngine {
    /// Start the refresh job over `orchestrator.refresh_scopes`.
    pub fn start_refresh(&self) -> ArchiveResult<RefreshHandle> {
        let scopes = self
            .config()
            .refresh_scopes
            .iter()
            .map(|key| {
                key.parse::<Scope>()
                    .map_err(|reason| ArchiveError::ConfigError(format!("refresh scope: {reason}")))
            })
            .collect::<ArchiveResult<Vec<_>>>()?;
        Ok(spawn_refresh(
            self.clone(),
            scopes,
            self.config().refresh_interval(),
            CancellationToken::new(),
        ))
    }
}

/// Spawn a job refreshing `scopes` every `interval` until `cancellation_token`
/// is cancelled. The first cycle runs immediately.
pub fn spawn_refresh(
    engine: CurationEngine,
    scopes: Vec<Scope>,
    interval: Duration,
    cancellation_token: CancellationToken,
) -> RefreshHandle {
    let token = cancellation_token.clone();
    let handle = tokio::spawn(async move {
        // `interval` panics on a zero period.
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    refresh_once(&engine, &scopes, &token)
                        .instrument(refresh_span!(scopes.len()))
                        .await;
                }
            }
        }
        tracing::info!("refresh job stopped");
    });
    RefreshHandle {
        cancellation_token,
        handle,
    }
}

/// One refresh cycle. Returns the number of arcs served across all scopes.
pub async fn refresh_once(
    engine: &CurationEngine,
    scopes: &[Scope],
    cancellation_token: &CancellationToken,
) -> usize {
    let mut total = 0;
    for scope in scopes {
        if cancellation_token.is_cancelled() {
            break;
        }
        match engine.generate_report(scope).await {
            Ok(report) => total += report.arcs.len(),
            Err(e) => tracing::warn!(scope_key = %scope, error = %e, "refresh failed"),
        }
    }
    tracing::debug!(arcs = total, "refresh cycle complete");
    total
}
