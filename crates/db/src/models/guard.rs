//! Guard directory rows and the scoring pool projection.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use shiftguard_core::types::{DbId, Timestamp};

/// A row from the `guards` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Guard {
    pub id: DbId,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a guard in the local directory.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGuard {
    pub full_name: String,
    pub role: Option<String>,
}

/// One guard's scoring inputs for a specific vacant shift.
///
/// Computed by `GuardRepo::candidate_pool`; `declared_available` is `None`
/// when the guard has no availability entry for the shift's day.
#[derive(Debug, Clone, FromRow)]
pub struct CandidatePoolRow {
    pub guard_id: DbId,
    pub full_name: String,
    pub declared_available: Option<bool>,
    pub has_overlapping_shift: bool,
    pub total_shifts: i64,
    pub attended_shifts: i64,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
}
