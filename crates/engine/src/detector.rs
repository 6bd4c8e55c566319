//! No-show detector.
//!
//! A pure read: lists `scheduled`, unclaimed shifts whose grace period has
//! elapsed. Claiming a detected shift is the orchestrator's job and happens
//! atomically in the store, so concurrent detector runs are harmless.

use std::sync::Arc;

use shiftguard_core::no_show::{detection_cutoff, is_no_show};
use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_core::types::Timestamp;
use shiftguard_db::models::shift::Shift;

use crate::error::EngineResult;
use crate::store::RosterStore;

#[derive(Clone)]
pub struct NoShowDetector {
    store: Arc<dyn RosterStore>,
    policy: Arc<ReplacementPolicy>,
}

impl NoShowDetector {
    pub fn new(store: Arc<dyn RosterStore>, policy: Arc<ReplacementPolicy>) -> Self {
        Self { store, policy }
    }

    /// Every shift that is a no-show at `now`, oldest start first.
    pub async fn detect(&self, now: Timestamp) -> EngineResult<Vec<Shift>> {
        let grace = self.policy.grace_period();
        let shifts = self
            .store
            .list_overdue_shifts(detection_cutoff(now, grace))
            .await?;

        let overdue: Vec<Shift> = shifts
            .into_iter()
            .filter(|s| {
                s.status().is_some_and(|status| {
                    is_no_show(status, s.start_time, s.replacement_required, now, grace)
                })
            })
            .collect();

        if !overdue.is_empty() {
            tracing::debug!(count = overdue.len(), %now, "Overdue shifts detected");
        }
        Ok(overdue)
    }
}
