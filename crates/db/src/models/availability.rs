//! Guard availability model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use shiftguard_core::types::{Day, DbId, Timestamp};

/// A row from the `guard_availability` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AvailabilityEntry {
    pub id: DbId,
    pub guard_id: DbId,
    pub available_on: Day,
    pub available: bool,
    pub reason: Option<String>,
    pub updated_at: Timestamp,
}

/// DTO for declaring availability. `date` may carry a time component; only
/// the UTC day is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SetAvailability {
    pub date: Timestamp,
    pub available: bool,
    pub reason: Option<String>,
}
