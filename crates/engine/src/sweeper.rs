//! Periodic sweep: expire stale offers, retry missed follow-up rounds, then
//! detect new no-shows.
//!
//! Expiry runs first so a shift whose offer just lapsed is never mistaken for
//! one still awaiting a response. Every step is idempotent, so overlapping
//! sweeps from several processes are harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use shiftguard_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::error::EngineResult;
use crate::Engine;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired: usize,
    pub follow_ups: usize,
    pub raised: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.follow_ups == 0 && self.raised == 0
    }
}

pub struct Sweeper {
    engine: Arc<Engine>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(engine: Arc<Engine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run one sweep at `now`.
    pub async fn sweep_once(&self, now: Timestamp) -> EngineResult<SweepReport> {
        let expired = self.engine.replacements.expire_stale(now).await?;
        let follow_ups = self.engine.replacements.retry_follow_ups(now).await?;
        let raised = self.engine.replacements.detect_and_raise(now).await?;
        Ok(SweepReport {
            expired: expired.len(),
            follow_ups: follow_ups.len(),
            raised: raised.len(),
        })
    }

    /// Sweep on a fixed interval until `cancel` fires. Failures are logged
    /// and retried on the next tick.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Replacement sweeper started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Replacement sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(report) if !report.is_empty() => {
                            tracing::info!(
                                expired = report.expired,
                                follow_ups = report.follow_ups,
                                raised = report.raised,
                                "Sweep complete"
                            );
                        }
                        Ok(_) => tracing::debug!("Sweep complete: nothing to do"),
                        Err(e) => tracing::error!(error = %e, "Sweep failed"),
                    }
                }
            }
        }
    }
}
