//! Attendance record model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::types::{DbId, Timestamp};

/// A row from the `attendance_records` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub guard_id: DbId,
    pub shift_id: DbId,
    pub check_in_time: Timestamp,
    pub check_out_time: Option<Timestamp>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub minutes_late: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}

/// Insert payload for a new open attendance record.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub guard_id: DbId,
    pub shift_id: DbId,
    pub check_in_time: Timestamp,
    pub location: Option<GeoPoint>,
    pub minutes_late: i32,
}

/// Result of the transactional check-in.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInResult {
    Recorded(AttendanceRecord),
    /// The shift was no longer in the expected status when the update ran.
    ShiftChanged,
    /// The guard already has an open record.
    DuplicateOpen,
}

/// Result of the conditional check-out.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutResult {
    Recorded {
        record: AttendanceRecord,
        shift_completed: bool,
    },
    /// The record was already closed (or does not exist).
    AlreadyClosed,
}
