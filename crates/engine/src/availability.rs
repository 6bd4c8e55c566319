//! Availability registry: per-guard, per-day declarations.
//!
//! Absence of an entry means available; see
//! [`shiftguard_core::availability::DEFAULT_AVAILABLE`].

use std::sync::Arc;

use serde::Serialize;
use shiftguard_core::availability::{day_of, resolve};
use shiftguard_core::types::{Day, DbId, Timestamp};
use shiftguard_db::models::availability::AvailabilityEntry;

use crate::error::{EngineError, EngineResult};
use crate::store::RosterStore;

/// Read-side answer for one guard and day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityStatus {
    pub guard_id: DbId,
    pub date: Day,
    pub available: bool,
    pub reason: Option<String>,
    /// `false` when no entry exists and the default applied.
    pub declared: bool,
}

pub struct AvailabilityRegistry {
    store: Arc<dyn RosterStore>,
}

impl AvailabilityRegistry {
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// Upsert the guard's entry for the UTC day of `date`. Last write wins.
    pub async fn set_availability(
        &self,
        guard_id: DbId,
        date: Timestamp,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> EngineResult<AvailabilityEntry> {
        if self.store.find_guard(guard_id).await?.is_none() {
            return Err(EngineError::not_found("guard", guard_id));
        }

        let day = day_of(date);
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let entry = self
            .store
            .upsert_availability(guard_id, day, available, reason, now)
            .await?;
        tracing::info!(guard_id, %day, available, "Availability set");
        Ok(entry)
    }

    pub async fn is_available(&self, guard_id: DbId, day: Day) -> EngineResult<bool> {
        Ok(self.status(guard_id, day).await?.available)
    }

    pub async fn status(&self, guard_id: DbId, day: Day) -> EngineResult<AvailabilityStatus> {
        let entry = self.store.find_availability(guard_id, day).await?;
        Ok(AvailabilityStatus {
            guard_id,
            date: day,
            available: resolve(entry.as_ref().map(|e| e.available)),
            declared: entry.is_some(),
            reason: entry.and_then(|e| e.reason),
        })
    }
}
