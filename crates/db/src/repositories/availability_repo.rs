//! Repository for the `guard_availability` table.

use sqlx::PgPool;
use shiftguard_core::types::{Day, DbId, Timestamp};

use crate::models::availability::AvailabilityEntry;

/// Column list for `guard_availability` queries.
const COLUMNS: &str = "id, guard_id, available_on, available, reason, updated_at";

/// Provides per-guard, per-day availability declarations.
pub struct AvailabilityRepo;

impl AvailabilityRepo {
    /// Insert or overwrite the guard's entry for `day`. Last write wins.
    pub async fn upsert(
        pool: &PgPool,
        guard_id: DbId,
        day: Day,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> Result<AvailabilityEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO guard_availability (guard_id, available_on, available, reason, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT ON CONSTRAINT uq_guard_availability_guard_day DO UPDATE SET \
                available = EXCLUDED.available, \
                reason = EXCLUDED.reason, \
                updated_at = EXCLUDED.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AvailabilityEntry>(&query)
            .bind(guard_id)
            .bind(day)
            .bind(available)
            .bind(reason)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        guard_id: DbId,
        day: Day,
    ) -> Result<Option<AvailabilityEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guard_availability WHERE guard_id = $1 AND available_on = $2"
        );
        sqlx::query_as::<_, AvailabilityEntry>(&query)
            .bind(guard_id)
            .bind(day)
            .fetch_optional(pool)
            .await
    }

    /// Entries for a guard from `from` onward, in date order.
    pub async fn list_for_guard(
        pool: &PgPool,
        guard_id: DbId,
        from: Day,
    ) -> Result<Vec<AvailabilityEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guard_availability \
             WHERE guard_id = $1 AND available_on >= $2 \
             ORDER BY available_on"
        );
        sqlx::query_as::<_, AvailabilityEntry>(&query)
            .bind(guard_id)
            .bind(from)
            .fetch_all(pool)
            .await
    }
}
