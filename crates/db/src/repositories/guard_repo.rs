//! Repository for the `guards` table and the replacement candidate pool.

use sqlx::PgPool;
use shiftguard_core::roles::ROLE_GUARD;
use shiftguard_core::shift::ACTIVE_STATUSES;
use shiftguard_core::status::{ShiftStatus, StatusId};
use shiftguard_core::types::{Day, DbId, Timestamp};

use crate::models::guard::{CandidatePoolRow, CreateGuard, Guard};

/// Column list for `guards` queries.
const COLUMNS: &str = "id, full_name, role, is_active, created_at, updated_at";

/// Provides directory lookups and the scoring snapshot query.
pub struct GuardRepo;

impl GuardRepo {
    /// Register a guard. Role defaults to `guard`.
    pub async fn create(pool: &PgPool, input: &CreateGuard) -> Result<Guard, sqlx::Error> {
        let query = format!(
            "INSERT INTO guards (full_name, role) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Guard>(&query)
            .bind(&input.full_name)
            .bind(input.role.as_deref().unwrap_or(ROLE_GUARD))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Guard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM guards WHERE id = $1");
        sqlx::query_as::<_, Guard>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Snapshot of every active guard's scoring inputs for one vacant shift.
    ///
    /// - `declared_available`: the guard's entry for `day`, if any.
    /// - `has_overlapping_shift`: another shift occupies the guard during
    ///   `[start, end)`: an active shift whose effective guard (the accepted
    ///   replacement if any, else the assigned guard) is this one.
    /// - `total_shifts`: shifts started by `now` for which the guard was
    ///   responsible and whose outcome is known (status past `scheduled`).
    /// - `attended_shifts`: distinct such shifts the guard checked in to.
    /// - `last_latitude/longitude`: location of the most recent located check-in.
    ///
    /// Guards listed in `excluded` (the absent guard, prior decliners) are
    /// omitted. Rows are ordered by guard id.
    #[allow(clippy::too_many_arguments)]
    pub async fn candidate_pool(
        pool: &PgPool,
        shift_id: DbId,
        start: Timestamp,
        end: Timestamp,
        day: Day,
        now: Timestamp,
        excluded: &[DbId],
    ) -> Result<Vec<CandidatePoolRow>, sqlx::Error> {
        let active: Vec<StatusId> = ACTIVE_STATUSES.iter().map(|s| s.id()).collect();
        sqlx::query_as::<_, CandidatePoolRow>(
            "SELECT g.id AS guard_id, g.full_name, \
                    ga.available AS declared_available, \
                    EXISTS ( \
                        SELECT 1 FROM shifts s \
                        WHERE s.id <> $1 \
                          AND COALESCE(s.replacement_guard_id, s.guard_id) = g.id \
                          AND s.status_id = ANY($7) \
                          AND s.start_time < $3 AND $2 < s.end_time \
                    ) AS has_overlapping_shift, \
                    ( \
                        SELECT COUNT(*) FROM shifts s \
                        WHERE (s.guard_id = g.id OR s.replacement_guard_id = g.id) \
                          AND s.status_id <> $8 AND s.start_time <= $5 \
                    ) AS total_shifts, \
                    ( \
                        SELECT COUNT(DISTINCT a.shift_id) FROM attendance_records a \
                        JOIN shifts s ON s.id = a.shift_id \
                        WHERE a.guard_id = g.id AND s.start_time <= $5 \
                    ) AS attended_shifts, \
                    loc.latitude AS last_latitude, \
                    loc.longitude AS last_longitude \
             FROM guards g \
             LEFT JOIN guard_availability ga \
                    ON ga.guard_id = g.id AND ga.available_on = $4 \
             LEFT JOIN LATERAL ( \
                    SELECT a.latitude, a.longitude FROM attendance_records a \
                    WHERE a.guard_id = g.id \
                      AND a.latitude IS NOT NULL AND a.longitude IS NOT NULL \
                    ORDER BY a.check_in_time DESC \
                    LIMIT 1 \
             ) loc ON true \
             WHERE g.is_active = true AND g.role = $9 AND g.id <> ALL($6) \
             ORDER BY g.id",
        )
        .bind(shift_id)
        .bind(start)
        .bind(end)
        .bind(day)
        .bind(now)
        .bind(excluded)
        .bind(active)
        .bind(ShiftStatus::Scheduled.id())
        .bind(ROLE_GUARD)
        .fetch_all(pool)
        .await
    }
}
