//! Tunable constants for no-show detection and replacement offers.
//!
//! [`ReplacementPolicy::default`] carries the production defaults; the
//! engine's `EngineConfig::from_env` overrides them from the environment.

use chrono::Duration;

use crate::error::CoreError;

/// Minutes after shift start before a missing check-in is a no-show.
pub const DEFAULT_GRACE_PERIOD_MINUTES: i64 = 15;

/// Minutes a replacement offer stays open.
pub const DEFAULT_OFFER_EXPIRY_MINUTES: i64 = 30;

/// Number of scored candidates retained on an offer.
pub const DEFAULT_CANDIDATE_POOL_SIZE: usize = 5;

/// Weight of the reliability component in the final score.
pub const DEFAULT_RELIABILITY_WEIGHT: f64 = 0.5;

/// Weight of the proximity component in the final score.
pub const DEFAULT_PROXIMITY_WEIGHT: f64 = 0.5;

/// Proximity score used when the site or guard location is unknown.
pub const DEFAULT_PROXIMITY_SCORE: f64 = 50.0;

/// Distance at which the proximity score reaches zero.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Upper bound on offer rounds (initial offer plus follow-ups) per shift.
pub const DEFAULT_MAX_OFFER_ROUNDS: i32 = 3;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Replacement orchestration policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementPolicy {
    pub grace_period_minutes: i64,
    pub offer_expiry_minutes: i64,
    pub candidate_pool_size: usize,
    pub reliability_weight: f64,
    pub proximity_weight: f64,
    pub default_proximity_score: f64,
    pub max_distance_km: f64,
    /// Complete a shift on check-out even before its scheduled end.
    pub allow_early_completion: bool,
    /// Raise a follow-up offer once every candidate has declined.
    pub reoffer_on_all_declined: bool,
    pub max_offer_rounds: i32,
}

impl Default for ReplacementPolicy {
    fn default() -> Self {
        Self {
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
            offer_expiry_minutes: DEFAULT_OFFER_EXPIRY_MINUTES,
            candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
            reliability_weight: DEFAULT_RELIABILITY_WEIGHT,
            proximity_weight: DEFAULT_PROXIMITY_WEIGHT,
            default_proximity_score: DEFAULT_PROXIMITY_SCORE,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            allow_early_completion: false,
            reoffer_on_all_declined: true,
            max_offer_rounds: DEFAULT_MAX_OFFER_ROUNDS,
        }
    }
}

impl ReplacementPolicy {
    pub fn grace_period(&self) -> Duration {
        Duration::minutes(self.grace_period_minutes)
    }

    pub fn offer_expiry(&self) -> Duration {
        Duration::minutes(self.offer_expiry_minutes)
    }

    /// Reject configurations that would make scoring or timing meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.grace_period_minutes <= 0 {
            return Err(CoreError::Validation(
                "grace_period_minutes must be positive".into(),
            ));
        }
        if self.offer_expiry_minutes <= 0 {
            return Err(CoreError::Validation(
                "offer_expiry_minutes must be positive".into(),
            ));
        }
        if self.candidate_pool_size == 0 {
            return Err(CoreError::Validation(
                "candidate_pool_size must be at least 1".into(),
            ));
        }
        let numeric = [
            ("reliability_weight", self.reliability_weight),
            ("proximity_weight", self.proximity_weight),
            ("default_proximity_score", self.default_proximity_score),
            ("max_distance_km", self.max_distance_km),
        ];
        if let Some((name, _)) = numeric.iter().find(|(_, value)| !value.is_finite()) {
            return Err(CoreError::Validation(format!("{name} must be a finite number")));
        }
        if self.reliability_weight < 0.0 || self.proximity_weight < 0.0 {
            return Err(CoreError::Validation(
                "score weights must not be negative".into(),
            ));
        }
        let sum = self.reliability_weight + self.proximity_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::Validation(format!(
                "score weights must sum to 1.0, got {sum}"
            )));
        }
        if !(0.0..=100.0).contains(&self.default_proximity_score) {
            return Err(CoreError::Validation(
                "default_proximity_score must be within [0, 100]".into(),
            ));
        }
        if self.max_distance_km <= 0.0 {
            return Err(CoreError::Validation(
                "max_distance_km must be positive".into(),
            ));
        }
        if self.max_offer_rounds < 1 {
            return Err(CoreError::Validation(
                "max_offer_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
