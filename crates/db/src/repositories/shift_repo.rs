//! Repository for the `shifts` table.
//!
//! Status literals come from [`ShiftStatus`]; no magic numbers.

use sqlx::PgPool;
use shiftguard_core::status::ShiftStatus;
use shiftguard_core::types::{DbId, Timestamp};

use crate::models::shift::{CreateShift, Shift};

/// Column list for `shifts` queries.
pub(crate) const COLUMNS: &str = "\
    id, guard_id, start_time, end_time, client_site, site_latitude, site_longitude, \
    status_id, replacement_required, replacement_guard_id, created_at, updated_at";

/// Provides shift scheduling, lookup and status transitions.
pub struct ShiftRepo;

impl ShiftRepo {
    /// Insert a new `scheduled` shift.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShift,
        now: Timestamp,
    ) -> Result<Shift, sqlx::Error> {
        let query = format!(
            "INSERT INTO shifts \
                (guard_id, start_time, end_time, client_site, site_latitude, site_longitude, \
                 status_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Shift>(&query)
            .bind(input.guard_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.client_site)
            .bind(input.site_latitude)
            .bind(input.site_longitude)
            .bind(ShiftStatus::Scheduled.id())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Shift>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shifts WHERE id = $1");
        sqlx::query_as::<_, Shift>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Shifts a guard works, as assigned guard or accepted replacement.
    pub async fn list_for_guard(pool: &PgPool, guard_id: DbId) -> Result<Vec<Shift>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shifts \
             WHERE guard_id = $1 OR replacement_guard_id = $1 \
             ORDER BY start_time DESC, id"
        );
        sqlx::query_as::<_, Shift>(&query)
            .bind(guard_id)
            .fetch_all(pool)
            .await
    }

    /// Range scan for no-show detection.
    ///
    /// Returns `scheduled`, unclaimed shifts with `start_time <= cutoff`,
    /// oldest first. Pure read.
    pub async fn list_overdue(pool: &PgPool, cutoff: Timestamp) -> Result<Vec<Shift>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shifts \
             WHERE status_id = $1 AND replacement_required = false AND start_time <= $2 \
             ORDER BY start_time, id"
        );
        sqlx::query_as::<_, Shift>(&query)
            .bind(ShiftStatus::Scheduled.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Conditionally move a shift from `from` to `to` inside a transaction.
    ///
    /// Returns `false` when the shift was not in `from`.
    pub(crate) async fn transition_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        shift_id: DbId,
        from: ShiftStatus,
        to: ShiftStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE shifts SET status_id = $3 WHERE id = $1 AND status_id = $2")
            .bind(shift_id)
            .bind(from.id())
            .bind(to.id())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically claim an overdue shift for replacement.
    ///
    /// `scheduled` + unclaimed becomes `no_show` with `replacement_required`
    /// set. Returns `false` if another caller claimed it first or the guard
    /// checked in.
    pub(crate) async fn claim_no_show_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        shift_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shifts SET status_id = $2, replacement_required = true \
             WHERE id = $1 AND status_id = $3 AND replacement_required = false",
        )
        .bind(shift_id)
        .bind(ShiftStatus::NoShow.id())
        .bind(ShiftStatus::Scheduled.id())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hand a `no_show` shift to its accepted replacement.
    pub(crate) async fn assign_replacement_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        shift_id: DbId,
        replacement_guard_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shifts SET status_id = $2, replacement_guard_id = $3 \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(shift_id)
        .bind(ShiftStatus::ReplacementAssigned.id())
        .bind(replacement_guard_id)
        .bind(ShiftStatus::NoShow.id())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Complete a shift that is being worked.
    pub(crate) async fn complete_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        shift_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shifts SET status_id = $2 WHERE id = $1 AND status_id IN ($3, $4)",
        )
        .bind(shift_id)
        .bind(ShiftStatus::Completed.id())
        .bind(ShiftStatus::InProgress.id())
        .bind(ShiftStatus::ReplacementAssigned.id())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
