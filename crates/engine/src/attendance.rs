//! Attendance recorder: check-in and check-out against a shift.
//!
//! The assigned guard checks in to a `scheduled` shift, moving it to
//! `in_progress`. An accepted replacement checks in to a
//! `replacement_assigned` shift, which keeps that status until check-out.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_core::shift::validate_transition;
use shiftguard_core::status::ShiftStatus;
use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::attendance::{
    AttendanceRecord, CheckInResult, CheckOutResult, NewAttendance,
};
use shiftguard_db::models::shift::Shift;
use shiftguard_events::{event_types, DomainEvent, EventBus};

use crate::error::{EngineError, EngineResult};
use crate::store::RosterStore;

/// Result of a successful check-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutOutcome {
    pub record: AttendanceRecord,
    pub shift_completed: bool,
}

pub struct AttendanceRecorder {
    store: Arc<dyn RosterStore>,
    policy: Arc<ReplacementPolicy>,
    bus: Arc<EventBus>,
}

impl AttendanceRecorder {
    pub fn new(
        store: Arc<dyn RosterStore>,
        policy: Arc<ReplacementPolicy>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self { store, policy, bus }
    }

    /// Open an attendance record for `guard_id` on `shift_id`.
    pub async fn check_in(
        &self,
        guard_id: DbId,
        shift_id: DbId,
        location: Option<GeoPoint>,
        now: Timestamp,
    ) -> EngineResult<AttendanceRecord> {
        if location.is_some_and(|p| !p.is_valid()) {
            return Err(EngineError::Validation(
                "check-in coordinates are out of range".into(),
            ));
        }

        let shift = self
            .store
            .find_shift(shift_id)
            .await?
            .ok_or(EngineError::not_found("shift", shift_id))?;

        if let Some(open) = self.store.find_open_attendance(guard_id).await? {
            return Err(EngineError::DuplicateCheckIn {
                guard_id,
                shift_id: open.shift_id,
            });
        }

        let (expected, next) = check_in_transition(&shift, guard_id)?;
        if now >= shift.end_time {
            return Err(EngineError::InvalidState(format!(
                "Shift {shift_id} ended at {}",
                shift.end_time
            )));
        }

        let input = NewAttendance {
            guard_id,
            shift_id,
            check_in_time: now,
            location,
            minutes_late: minutes_late(shift.start_time, now),
        };
        let record = match self.store.check_in(&input, expected, next).await? {
            CheckInResult::Recorded(record) => record,
            CheckInResult::DuplicateOpen => {
                return Err(EngineError::DuplicateCheckIn { guard_id, shift_id });
            }
            CheckInResult::ShiftChanged => {
                return Err(EngineError::InvalidState(format!(
                    "Shift {shift_id} changed status during check-in"
                )));
            }
        };

        tracing::info!(
            attendance_id = record.id,
            guard_id,
            shift_id,
            minutes_late = record.minutes_late,
            shift_status = %next,
            "Guard checked in"
        );
        self.bus.publish(
            DomainEvent::new(event_types::ATTENDANCE_CHECKED_IN, now)
                .with_source("shift", shift_id)
                .with_actor(guard_id)
                .with_payload(json!({
                    "attendance_id": record.id,
                    "minutes_late": record.minutes_late,
                })),
        );
        Ok(record)
    }

    /// Close an open attendance record.
    ///
    /// The shift is completed when `now` has reached its end time, or at any
    /// time if the policy allows early completion.
    pub async fn check_out(
        &self,
        attendance_id: DbId,
        now: Timestamp,
    ) -> EngineResult<CheckOutOutcome> {
        let record = self
            .store
            .find_attendance(attendance_id)
            .await?
            .ok_or(EngineError::not_found("attendance record", attendance_id))?;
        if !record.is_open() {
            return Err(EngineError::AlreadyCheckedOut { attendance_id });
        }
        if now < record.check_in_time {
            return Err(EngineError::Validation(
                "check-out time precedes check-in time".into(),
            ));
        }

        let shift = self
            .store
            .find_shift(record.shift_id)
            .await?
            .ok_or(EngineError::not_found("shift", record.shift_id))?;
        let complete = now >= shift.end_time || self.policy.allow_early_completion;

        let (record, shift_completed) =
            match self.store.check_out(attendance_id, now, complete).await? {
                CheckOutResult::Recorded {
                    record,
                    shift_completed,
                } => (record, shift_completed),
                CheckOutResult::AlreadyClosed => {
                    return Err(EngineError::AlreadyCheckedOut { attendance_id });
                }
            };

        tracing::info!(
            attendance_id,
            guard_id = record.guard_id,
            shift_id = record.shift_id,
            shift_completed,
            "Guard checked out"
        );
        self.bus.publish(
            DomainEvent::new(event_types::ATTENDANCE_CHECKED_OUT, now)
                .with_source("shift", record.shift_id)
                .with_actor(record.guard_id)
                .with_payload(json!({
                    "attendance_id": attendance_id,
                    "shift_completed": shift_completed,
                })),
        );
        Ok(CheckOutOutcome {
            record,
            shift_completed,
        })
    }

    pub async fn get(&self, attendance_id: DbId) -> EngineResult<AttendanceRecord> {
        self.store
            .find_attendance(attendance_id)
            .await?
            .ok_or(EngineError::not_found("attendance record", attendance_id))
    }
}

/// Which status change a check-in by `guard_id` performs on `shift`.
fn check_in_transition(shift: &Shift, guard_id: DbId) -> EngineResult<(ShiftStatus, ShiftStatus)> {
    let status = shift
        .status()
        .ok_or_else(|| EngineError::InvalidState(format!("Shift {} has unknown status", shift.id)))?;

    if shift.replacement_guard_id == Some(guard_id) {
        return match status {
            ShiftStatus::ReplacementAssigned => {
                Ok((ShiftStatus::ReplacementAssigned, ShiftStatus::ReplacementAssigned))
            }
            other => Err(EngineError::InvalidState(format!(
                "Cannot check in to shift {} in status {other}",
                shift.id
            ))),
        };
    }

    if shift.guard_id != guard_id {
        return Err(EngineError::InvalidState(format!(
            "Guard {guard_id} is not assigned to shift {}",
            shift.id
        )));
    }

    validate_transition(status, ShiftStatus::InProgress).map_err(EngineError::InvalidState)?;
    Ok((status, ShiftStatus::InProgress))
}

/// Whole minutes between shift start and check-in, never negative.
fn minutes_late(start_time: Timestamp, check_in: Timestamp) -> i32 {
    (check_in - start_time).num_minutes().clamp(0, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
    }

    fn shift(status: ShiftStatus, replacement: Option<DbId>) -> Shift {
        Shift {
            id: 1,
            guard_id: 10,
            start_time: at(8, 0, 0),
            end_time: at(16, 0, 0),
            client_site: "Dock 4".into(),
            site_latitude: None,
            site_longitude: None,
            status_id: status.id(),
            replacement_required: replacement.is_some(),
            replacement_guard_id: replacement,
            created_at: at(6, 0, 0),
            updated_at: at(6, 0, 0),
        }
    }

    #[test]
    fn early_and_punctual_arrivals_are_not_late() {
        assert_eq!(minutes_late(at(8, 0, 0), at(7, 50, 0)), 0);
        assert_eq!(minutes_late(at(8, 0, 0), at(8, 0, 59)), 0);
        assert_eq!(minutes_late(at(8, 0, 0), at(8, 5, 0)), 5);
    }

    #[test]
    fn assigned_guard_moves_scheduled_to_in_progress() {
        let (from, to) = check_in_transition(&shift(ShiftStatus::Scheduled, None), 10).unwrap();
        assert_eq!((from, to), (ShiftStatus::Scheduled, ShiftStatus::InProgress));
    }

    #[test]
    fn replacement_keeps_replacement_assigned() {
        let s = shift(ShiftStatus::ReplacementAssigned, Some(20));
        let (from, to) = check_in_transition(&s, 20).unwrap();
        assert_eq!(from, ShiftStatus::ReplacementAssigned);
        assert_eq!(to, ShiftStatus::ReplacementAssigned);
    }

    #[test]
    fn absent_guard_cannot_check_in_after_replacement() {
        let s = shift(ShiftStatus::ReplacementAssigned, Some(20));
        assert!(check_in_transition(&s, 10).is_err());
        assert!(check_in_transition(&shift(ShiftStatus::NoShow, None), 10).is_err());
    }

    #[test]
    fn stranger_cannot_check_in() {
        assert!(check_in_transition(&shift(ShiftStatus::Scheduled, None), 99).is_err());
    }
}
