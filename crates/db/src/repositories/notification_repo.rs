//! Repository for the `notifications` table.

use sqlx::PgPool;
use shiftguard_core::types::{DbId, Timestamp};

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "\
    id, guard_id, title, message, related_shift_id, related_request_id, \
    expires_at, is_read, read_at, created_at";

/// Provides the in-app notification inbox.
pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                (guard_id, title, message, related_shift_id, related_request_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.guard_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.related_shift_id)
            .bind(input.related_request_id)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// A guard's notifications, newest first.
    pub async fn list_for_guard(
        pool: &PgPool,
        guard_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE guard_id = $1 AND ($2 = false OR is_read = false) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(guard_id)
            .bind(unread_only)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark one of the guard's notifications read. `None` if it is not theirs.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET is_read = true, read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND guard_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(guard_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }
}
