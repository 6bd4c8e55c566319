//! Guard notification delivery.
//!
//! The engine talks to a [`Notifier`]; delivery is fire-and-forget and a
//! failure never affects the operation that triggered it. The production
//! [`NotificationDispatcher`](dispatcher::NotificationDispatcher) enqueues
//! onto a bounded channel drained by
//! [`NotificationWorker`](worker::NotificationWorker), which stores the in-app
//! notification and optionally forwards it to an SMS gateway.

pub mod dispatcher;
pub mod sms;
pub mod worker;

use serde::Serialize;
use shiftguard_core::types::{DbId, Timestamp};

/// A message addressed to one guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardNotification {
    pub guard_id: DbId,
    pub title: String,
    pub message: String,
    pub related_shift_id: Option<DbId>,
    pub related_request_id: Option<DbId>,
    /// For offers: when the offer stops accepting responses.
    pub expires_at: Option<Timestamp>,
}

/// Why a notification could not be handed off.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification channel is closed")]
    Closed,
}

/// Outbound notification seam.
///
/// `notify` must not block; implementations enqueue and return.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: GuardNotification) -> Result<(), NotifyError>;
}
