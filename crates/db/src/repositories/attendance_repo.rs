//! Repository for the `attendance_records` table.
//!
//! Check-in and check-out each run in one transaction together with the
//! shift status change they imply.

use sqlx::PgPool;
use shiftguard_core::status::ShiftStatus;
use shiftguard_core::types::{DbId, Timestamp};

use crate::is_unique_violation;
use crate::models::attendance::{AttendanceRecord, CheckInResult, CheckOutResult, NewAttendance};
use crate::repositories::shift_repo::ShiftRepo;

/// Column list for `attendance_records` queries.
const COLUMNS: &str = "\
    id, guard_id, shift_id, check_in_time, check_out_time, latitude, longitude, \
    minutes_late, created_at, updated_at";

/// Partial unique index enforcing one open record per guard.
const OPEN_GUARD_INDEX: &str = "uq_attendance_records_open_guard";

/// Provides attendance recording and lookups.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Record a check-in and move the shift from `expected` to `next`.
    ///
    /// `expected == next` is allowed and simply asserts the status (used when
    /// an accepted replacement checks in). Nothing is written unless both the
    /// status guard and the insert succeed.
    pub async fn check_in(
        pool: &PgPool,
        input: &NewAttendance,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> Result<CheckInResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !ShiftRepo::transition_in_tx(&mut tx, input.shift_id, expected, next).await? {
            return Ok(CheckInResult::ShiftChanged);
        }

        let query = format!(
            "INSERT INTO attendance_records \
                (guard_id, shift_id, check_in_time, latitude, longitude, minutes_late) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(input.guard_id)
            .bind(input.shift_id)
            .bind(input.check_in_time)
            .bind(input.location.map(|p| p.latitude))
            .bind(input.location.map(|p| p.longitude))
            .bind(input.minutes_late)
            .fetch_one(&mut *tx)
            .await;

        let record = match inserted {
            Ok(record) => record,
            Err(err) if is_unique_violation(&err, OPEN_GUARD_INDEX) => {
                return Ok(CheckInResult::DuplicateOpen);
            }
            Err(err) => return Err(err),
        };

        tx.commit().await?;
        Ok(CheckInResult::Recorded(record))
    }

    /// Close an open record, optionally completing its shift in the same
    /// transaction.
    pub async fn check_out(
        pool: &PgPool,
        attendance_id: DbId,
        at: Timestamp,
        complete_shift: bool,
    ) -> Result<CheckOutResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE attendance_records SET check_out_time = $2 \
             WHERE id = $1 AND check_out_time IS NULL \
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(attendance_id)
            .bind(at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(record) = record else {
            return Ok(CheckOutResult::AlreadyClosed);
        };

        let shift_completed = if complete_shift {
            ShiftRepo::complete_in_tx(&mut tx, record.shift_id).await?
        } else {
            false
        };

        tx.commit().await?;
        Ok(CheckOutResult::Recorded {
            record,
            shift_completed,
        })
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM attendance_records WHERE id = $1");
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The guard's open record, if any.
    pub async fn find_open_for_guard(
        pool: &PgPool,
        guard_id: DbId,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records \
             WHERE guard_id = $1 AND check_out_time IS NULL"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(guard_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_shift(
        pool: &PgPool,
        shift_id: DbId,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records \
             WHERE shift_id = $1 ORDER BY check_in_time"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(shift_id)
            .fetch_all(pool)
            .await
    }
}
