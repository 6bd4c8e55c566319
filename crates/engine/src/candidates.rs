//! Candidate scorer: snapshot the guard pool, then rank it.
//!
//! The snapshot is taken once per offer; ranking is the pure
//! [`score_candidates`] over that snapshot.

use std::sync::Arc;

use shiftguard_core::availability::{day_of, resolve};
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_core::scoring::{score_candidates, GuardSnapshot, ScoredCandidate};
use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::guard::CandidatePoolRow;
use shiftguard_db::models::shift::Shift;

use crate::error::EngineResult;
use crate::store::{PoolQuery, RosterStore};

#[derive(Clone)]
pub struct CandidateScorer {
    store: Arc<dyn RosterStore>,
    policy: Arc<ReplacementPolicy>,
}

impl CandidateScorer {
    pub fn new(store: Arc<dyn RosterStore>, policy: Arc<ReplacementPolicy>) -> Self {
        Self { store, policy }
    }

    /// Scoring inputs for every active guard except the shift's own guard
    /// and `excluded`.
    pub async fn snapshot(
        &self,
        shift: &Shift,
        excluded: &[DbId],
        now: Timestamp,
    ) -> EngineResult<Vec<GuardSnapshot>> {
        let mut excluded = excluded.to_vec();
        if !excluded.contains(&shift.guard_id) {
            excluded.push(shift.guard_id);
        }

        let query = PoolQuery {
            shift_id: shift.id,
            start_time: shift.start_time,
            end_time: shift.end_time,
            day: day_of(shift.start_time),
            now,
            excluded,
        };
        let rows = self.store.candidate_pool(&query).await?;
        Ok(rows.into_iter().map(to_snapshot).collect())
    }

    /// Ranked top-N candidates for `shift`.
    pub async fn rank(
        &self,
        shift: &Shift,
        excluded: &[DbId],
        now: Timestamp,
    ) -> EngineResult<Vec<ScoredCandidate>> {
        let pool = self.snapshot(shift, excluded, now).await?;
        let ranked = score_candidates(shift.site_location(), &pool, &self.policy);
        tracing::debug!(
            shift_id = shift.id,
            pool = pool.len(),
            ranked = ranked.len(),
            "Candidates scored"
        );
        Ok(ranked)
    }
}

fn to_snapshot(row: CandidatePoolRow) -> GuardSnapshot {
    GuardSnapshot {
        guard_id: row.guard_id,
        guard_name: row.full_name,
        available: resolve(row.declared_available),
        has_overlapping_shift: row.has_overlapping_shift,
        total_shifts: row.total_shifts,
        attended_shifts: row.attended_shifts,
        last_location: GeoPoint::from_parts(row.last_latitude, row.last_longitude),
    }
}
