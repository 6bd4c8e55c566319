//! In-app notification model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use shiftguard_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub guard_id: DbId,
    pub title: String,
    pub message: String,
    pub related_shift_id: Option<DbId>,
    pub related_request_id: Option<DbId>,
    pub expires_at: Option<Timestamp>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub guard_id: DbId,
    pub title: String,
    pub message: String,
    pub related_shift_id: Option<DbId>,
    pub related_request_id: Option<DbId>,
    pub expires_at: Option<Timestamp>,
}
