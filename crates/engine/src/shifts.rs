//! Shift scheduling and the guard directory.

use std::sync::Arc;

use serde_json::json;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::roles::{ROLE_ADMIN, ROLE_GUARD};
use shiftguard_core::shift::validate_new_shift;
use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::guard::{CreateGuard, Guard};
use shiftguard_db::models::shift::{CreateShift, Shift};
use shiftguard_events::{event_types, DomainEvent, EventBus};

use crate::error::{EngineError, EngineResult};
use crate::store::RosterStore;

pub struct ShiftService {
    store: Arc<dyn RosterStore>,
    bus: Arc<EventBus>,
}

impl ShiftService {
    pub fn new(store: Arc<dyn RosterStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }

    /// Register a guard in the local directory (projection of the identity
    /// service).
    pub async fn register_guard(&self, input: &CreateGuard) -> EngineResult<Guard> {
        if input.full_name.trim().is_empty() {
            return Err(EngineError::Validation("full_name must not be empty".into()));
        }
        if let Some(role) = input.role.as_deref() {
            if role != ROLE_GUARD && role != ROLE_ADMIN {
                return Err(EngineError::Validation(format!("Unknown role '{role}'")));
            }
        }
        let input = CreateGuard {
            full_name: input.full_name.trim().to_string(),
            role: input.role.clone(),
        };
        let guard = self.store.create_guard(&input).await?;
        tracing::info!(guard_id = guard.id, role = %guard.role, "Guard registered");
        Ok(guard)
    }

    pub async fn get_guard(&self, id: DbId) -> EngineResult<Guard> {
        self.store
            .find_guard(id)
            .await?
            .ok_or(EngineError::not_found("guard", id))
    }

    /// Schedule a shift for an active guard.
    pub async fn create_shift(&self, input: &CreateShift, now: Timestamp) -> EngineResult<Shift> {
        validate_new_shift(input.start_time, input.end_time, &input.client_site)?;
        validate_site(input.site_latitude, input.site_longitude)?;

        let guard = self.get_guard(input.guard_id).await?;
        if !guard.is_active {
            return Err(EngineError::InvalidState(format!(
                "Guard {} is not active",
                guard.id
            )));
        }

        let shift = self.store.create_shift(input, now).await?;
        tracing::info!(
            shift_id = shift.id,
            guard_id = shift.guard_id,
            start_time = %shift.start_time,
            client_site = %shift.client_site,
            "Shift scheduled"
        );
        self.bus.publish(
            DomainEvent::new(event_types::SHIFT_CREATED, now)
                .with_source("shift", shift.id)
                .with_payload(json!({
                    "guard_id": shift.guard_id,
                    "start_time": shift.start_time,
                    "end_time": shift.end_time,
                })),
        );
        Ok(shift)
    }

    pub async fn get_shift(&self, id: DbId) -> EngineResult<Shift> {
        self.store
            .find_shift(id)
            .await?
            .ok_or(EngineError::not_found("shift", id))
    }

    /// Shifts the guard works, as assignee or accepted replacement.
    pub async fn list_for_guard(&self, guard_id: DbId) -> EngineResult<Vec<Shift>> {
        Ok(self.store.list_shifts_for_guard(guard_id).await?)
    }
}

/// Site coordinates are optional but must come as a valid pair.
fn validate_site(latitude: Option<f64>, longitude: Option<f64>) -> EngineResult<()> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) if GeoPoint::new(lat, lon).is_valid() => Ok(()),
        (Some(_), Some(_)) => Err(EngineError::Validation(
            "site coordinates are out of range".into(),
        )),
        _ => Err(EngineError::Validation(
            "site_latitude and site_longitude must be given together".into(),
        )),
    }
}
