//! Engine configuration loaded from the environment.

use std::time::Duration;

use shiftguard_core::policy::{
    ReplacementPolicy, DEFAULT_CANDIDATE_POOL_SIZE, DEFAULT_GRACE_PERIOD_MINUTES,
    DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_OFFER_ROUNDS, DEFAULT_OFFER_EXPIRY_MINUTES,
    DEFAULT_PROXIMITY_SCORE, DEFAULT_PROXIMITY_WEIGHT, DEFAULT_RELIABILITY_WEIGHT,
};
use shiftguard_events::delivery::dispatcher::DEFAULT_QUEUE_CAPACITY;

/// Default interval between detection/expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Policy plus background-task settings shared by the API server and worker.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub policy: ReplacementPolicy,
    pub sweep_interval: Duration,
    /// Whether the API server runs its own sweeper (the worker always does).
    pub sweeper_enabled: bool,
    pub notification_queue_capacity: usize,
    pub sms_webhook_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ReplacementPolicy::default(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            sweeper_enabled: true,
            notification_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sms_webhook_url: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default  |
    /// |-------------------------------|----------|
    /// | `GRACE_PERIOD_MINUTES`        | `15`     |
    /// | `OFFER_EXPIRY_MINUTES`        | `30`     |
    /// | `CANDIDATE_POOL_SIZE`         | `5`      |
    /// | `RELIABILITY_WEIGHT`          | `0.5`    |
    /// | `PROXIMITY_WEIGHT`            | `0.5`    |
    /// | `DEFAULT_PROXIMITY_SCORE`     | `50`     |
    /// | `MAX_DISTANCE_KM`             | `50`     |
    /// | `ALLOW_EARLY_COMPLETION`      | `false`  |
    /// | `REOFFER_ON_ALL_DECLINED`     | `true`   |
    /// | `MAX_OFFER_ROUNDS`            | `3`      |
    /// | `SWEEP_INTERVAL_SECS`         | `60`     |
    /// | `SWEEPER_ENABLED`             | `true`   |
    /// | `NOTIFICATION_QUEUE_CAPACITY` | `1024`   |
    /// | `SMS_WEBHOOK_URL`             | *(none)* |
    ///
    /// Panics on unparsable values, an invalid policy, or a zero sweep
    /// interval or queue capacity; this runs once at startup.
    pub fn from_env() -> Self {
        let policy = ReplacementPolicy {
            grace_period_minutes: env_or("GRACE_PERIOD_MINUTES", DEFAULT_GRACE_PERIOD_MINUTES),
            offer_expiry_minutes: env_or("OFFER_EXPIRY_MINUTES", DEFAULT_OFFER_EXPIRY_MINUTES),
            candidate_pool_size: env_or("CANDIDATE_POOL_SIZE", DEFAULT_CANDIDATE_POOL_SIZE),
            reliability_weight: env_or("RELIABILITY_WEIGHT", DEFAULT_RELIABILITY_WEIGHT),
            proximity_weight: env_or("PROXIMITY_WEIGHT", DEFAULT_PROXIMITY_WEIGHT),
            default_proximity_score: env_or("DEFAULT_PROXIMITY_SCORE", DEFAULT_PROXIMITY_SCORE),
            max_distance_km: env_or("MAX_DISTANCE_KM", DEFAULT_MAX_DISTANCE_KM),
            allow_early_completion: env_or("ALLOW_EARLY_COMPLETION", false),
            reoffer_on_all_declined: env_or("REOFFER_ON_ALL_DECLINED", true),
            max_offer_rounds: env_or("MAX_OFFER_ROUNDS", DEFAULT_MAX_OFFER_ROUNDS),
        };
        if let Err(e) = policy.validate() {
            panic!("Invalid replacement policy: {e}");
        }

        let sms_webhook_url = std::env::var("SMS_WEBHOOK_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let config = Self {
            policy,
            sweep_interval: Duration::from_secs(env_or(
                "SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            sweeper_enabled: env_or("SWEEPER_ENABLED", true),
            notification_queue_capacity: env_or(
                "NOTIFICATION_QUEUE_CAPACITY",
                DEFAULT_QUEUE_CAPACITY,
            ),
            sms_webhook_url,
        };
        if let Err(e) = config.validate() {
            panic!("Invalid engine configuration: {e}");
        }
        config
    }

    /// Check the background-task settings. The policy has its own
    /// [`ReplacementPolicy::validate`].
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval.is_zero() {
            return Err("SWEEP_INTERVAL_SECS must be at least 1".into());
        }
        if self.notification_queue_capacity == 0 {
            return Err("NOTIFICATION_QUEUE_CAPACITY must be at least 1".into());
        }
        Ok(())
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
