//! Replacement candidate scoring.
//!
//! Scoring is a pure function over a snapshot of the guard pool taken when
//! the offer is raised. The resulting ranking is stored on the offer and never
//! recomputed, so later availability changes do not alter an existing offer.
//!
//! ```text
//! reliability = attended / total * 100        (0 when total == 0)
//! proximity   = 100 - distance / max * 100    (clamped to [0, 100];
//!                                              default when location unknown)
//! final       = reliability * w_r + proximity * w_p, rounded to 0.1
//! ```

use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::policy::ReplacementPolicy;
use crate::types::DbId;

/// Everything the scorer needs to know about one guard.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardSnapshot {
    pub guard_id: DbId,
    pub guard_name: String,
    /// Declared availability for the shift's day (default already applied).
    pub available: bool,
    /// The guard holds another active shift overlapping the vacant one.
    pub has_overlapping_shift: bool,
    pub total_shifts: i64,
    pub attended_shifts: i64,
    pub last_location: Option<GeoPoint>,
}

impl GuardSnapshot {
    pub fn is_eligible(&self) -> bool {
        self.available && !self.has_overlapping_shift
    }
}

/// A ranked candidate for a replacement offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub guard_id: DbId,
    pub guard_name: String,
    pub score: f64,
    pub reliability_score: f64,
    pub proximity_score: f64,
    pub distance_km: Option<f64>,
}

/// Historical attendance rate in [0, 100].
///
/// A guard with no history scores 0 rather than NaN.
pub fn reliability_score(attended_shifts: i64, total_shifts: i64) -> f64 {
    if total_shifts <= 0 {
        return 0.0;
    }
    let attended = attended_shifts.clamp(0, total_shifts) as f64;
    attended / total_shifts as f64 * 100.0
}

/// Distance-based fitness in [0, 100].
pub fn proximity_score(distance_km: Option<f64>, policy: &ReplacementPolicy) -> f64 {
    match distance_km {
        Some(d) if d.is_finite() => {
            (100.0 - (d / policy.max_distance_km) * 100.0).clamp(0.0, 100.0)
        }
        _ => policy.default_proximity_score,
    }
}

/// Weighted combination rounded to one decimal place.
pub fn final_score(reliability: f64, proximity: f64, policy: &ReplacementPolicy) -> f64 {
    round_one_decimal(reliability * policy.reliability_weight + proximity * policy.proximity_weight)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score a single eligible guard against the shift site.
pub fn score_guard(
    guard: &GuardSnapshot,
    site: Option<GeoPoint>,
    policy: &ReplacementPolicy,
) -> ScoredCandidate {
    let distance_km = match (site, guard.last_location) {
        (Some(site), Some(location)) => Some(site.distance_km(&location)),
        _ => None,
    };
    let reliability = reliability_score(guard.attended_shifts, guard.total_shifts);
    let proximity = proximity_score(distance_km, policy);

    ScoredCandidate {
        guard_id: guard.guard_id,
        guard_name: guard.guard_name.clone(),
        score: final_score(reliability, proximity, policy),
        reliability_score: round_one_decimal(reliability),
        proximity_score: round_one_decimal(proximity),
        distance_km,
    }
}

/// Descending by score, ties broken by ascending guard id.
fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.guard_id.cmp(&b.guard_id))
}

/// Rank the eligible guards of `pool` for a shift at `site`.
///
/// Ineligible guards (unavailable, or busy with an overlapping shift) are
/// dropped before scoring. At most `policy.candidate_pool_size` candidates are
/// returned, sorted by [`rank_order`]. Deterministic for identical inputs.
pub fn score_candidates(
    site: Option<GeoPoint>,
    pool: &[GuardSnapshot],
    policy: &ReplacementPolicy,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = pool
        .iter()
        .filter(|guard| guard.is_eligible())
        .map(|guard| score_guard(guard, site, policy))
        .collect();

    scored.sort_by(rank_order);
    scored.truncate(policy.candidate_pool_size);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(id: DbId, attended: i64, total: i64, location: Option<GeoPoint>) -> GuardSnapshot {
        GuardSnapshot {
            guard_id: id,
            guard_name: format!("Guard {id}"),
            available: true,
            has_overlapping_shift: false,
            total_shifts: total,
            attended_shifts: attended,
            last_location: location,
        }
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    #[test]
    fn zero_history_scores_zero_reliability() {
        let score = reliability_score(0, 0);
        assert_eq!(score, 0.0);
        assert!(!score.is_nan());
    }

    #[test]
    fn reliability_is_attendance_rate() {
        assert_eq!(reliability_score(3, 4), 75.0);
        assert_eq!(reliability_score(10, 10), 100.0);
    }

    #[test]
    fn reliability_never_exceeds_100() {
        assert_eq!(reliability_score(12, 10), 100.0);
    }

    #[test]
    fn unknown_location_gets_default_proximity() {
        let policy = ReplacementPolicy::default();
        assert_eq!(proximity_score(None, &policy), 50.0);
    }

    #[test]
    fn proximity_is_linear_and_clamped() {
        let policy = ReplacementPolicy::default();
        assert_eq!(proximity_score(Some(0.0), &policy), 100.0);
        assert_eq!(proximity_score(Some(25.0), &policy), 50.0);
        assert_eq!(proximity_score(Some(80.0), &policy), 0.0);
    }

    #[test]
    fn final_score_rounds_to_one_decimal() {
        let policy = ReplacementPolicy::default();
        // 66.666.. * 0.5 + 50 * 0.5 = 58.333..
        let reliability = reliability_score(2, 3);
        assert_eq!(final_score(reliability, 50.0, &policy), 58.3);
    }

    // -----------------------------------------------------------------------
    // Ranking
    // -----------------------------------------------------------------------

    #[test]
    fn ineligible_guards_are_excluded() {
        let policy = ReplacementPolicy::default();
        let mut unavailable = guard(1, 10, 10, None);
        unavailable.available = false;
        let mut busy = guard(2, 10, 10, None);
        busy.has_overlapping_shift = true;
        let free = guard(3, 0, 0, None);

        let ranked = score_candidates(None, &[unavailable, busy, free], &policy);
        let ids: Vec<DbId> = ranked.iter().map(|c| c.guard_id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn sorted_descending_and_truncated_to_pool_size() {
        let policy = ReplacementPolicy::default();
        let pool: Vec<GuardSnapshot> = (1..=8).map(|id| guard(id, id, 8, None)).collect();

        let ranked = score_candidates(None, &pool, &policy);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].guard_id, 8);
        assert!(ranked.iter().all(|c| (0.0..=100.0).contains(&c.score)));
    }

    #[test]
    fn ties_break_by_guard_id() {
        let policy = ReplacementPolicy::default();
        let pool = vec![guard(30, 1, 2, None), guard(10, 1, 2, None), guard(20, 1, 2, None)];

        let ranked = score_candidates(None, &pool, &policy);
        let ids: Vec<DbId> = ranked.iter().map(|c| c.guard_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn identical_inputs_give_identical_rankings() {
        let policy = ReplacementPolicy::default();
        let site = Some(GeoPoint::new(14.55, 121.02));
        let pool = vec![
            guard(4, 5, 6, Some(GeoPoint::new(14.60, 121.00))),
            guard(2, 3, 6, None),
            guard(9, 6, 6, Some(GeoPoint::new(14.90, 121.30))),
            guard(1, 5, 6, Some(GeoPoint::new(14.60, 121.00))),
        ];

        let first = score_candidates(site, &pool, &policy);
        let second = score_candidates(site, &pool, &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn nearby_guard_outranks_distant_guard_with_same_history() {
        let policy = ReplacementPolicy::default();
        let site = Some(GeoPoint::new(14.5547, 121.0244));
        let near = guard(2, 4, 5, Some(GeoPoint::new(14.5600, 121.0300)));
        let far = guard(1, 4, 5, Some(GeoPoint::new(14.9000, 121.4000)));

        let ranked = score_candidates(site, &[far, near], &policy);
        assert_eq!(ranked[0].guard_id, 2);
        assert!(ranked[0].distance_km.unwrap() < 1.0);
    }

    #[test]
    fn empty_pool_yields_no_candidates() {
        let policy = ReplacementPolicy::default();
        assert!(score_candidates(None, &[], &policy).is_empty());
    }
}
