//! Shift entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::status::{ShiftStatus, StatusId};
use shiftguard_core::types::{DbId, Timestamp};

/// A row from the `shifts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Shift {
    pub id: DbId,
    pub guard_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub client_site: String,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
    pub status_id: StatusId,
    pub replacement_required: bool,
    pub replacement_guard_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Shift {
    /// Typed status; `None` only if the row carries an unknown status ID.
    pub fn status(&self) -> Option<ShiftStatus> {
        ShiftStatus::from_id(self.status_id)
    }

    pub fn has_status(&self, status: ShiftStatus) -> bool {
        self.status_id == status.id()
    }

    pub fn site_location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.site_latitude, self.site_longitude)
    }
}

/// DTO for scheduling a new shift.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShift {
    pub guard_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub client_site: String,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
}
