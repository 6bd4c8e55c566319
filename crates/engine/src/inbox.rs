//! Guard-facing notification inbox.

use std::sync::Arc;

use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::notification::Notification;

use crate::error::{EngineError, EngineResult};
use crate::store::RosterStore;

/// Default page size for inbox listings.
pub const DEFAULT_INBOX_LIMIT: i64 = 50;

pub struct NotificationInbox {
    store: Arc<dyn RosterStore>,
}

impl NotificationInbox {
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn list(
        &self,
        guard_id: DbId,
        unread_only: bool,
        limit: Option<i64>,
    ) -> EngineResult<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_INBOX_LIMIT).clamp(1, 500);
        Ok(self
            .store
            .list_notifications(guard_id, unread_only, limit)
            .await?)
    }

    /// Mark one of the guard's notifications as read. Marking twice keeps the
    /// first `read_at`.
    pub async fn mark_read(
        &self,
        notification_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> EngineResult<Notification> {
        self.store
            .mark_notification_read(notification_id, guard_id, now)
            .await?
            .ok_or(EngineError::not_found("notification", notification_id))
    }
}
