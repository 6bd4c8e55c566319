//! Domain event bus and guard notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope raised by the replacement engine.
//! - [`EventPersistence`]: background service that writes every event to the
//!   `events` table.
//! - [`delivery`]: the [`Notifier`] seam, the bounded fire-and-forget
//!   [`NotificationDispatcher`] and the [`NotificationWorker`] that persists
//!   and forwards notifications.

pub mod bus;
pub mod delivery;
pub mod persistence;

pub use bus::{event_types, DomainEvent, EventBus};
pub use delivery::dispatcher::NotificationDispatcher;
pub use delivery::sms::SmsWebhook;
pub use delivery::worker::NotificationWorker;
pub use delivery::{GuardNotification, NotifyError, Notifier};
pub use persistence::EventPersistence;
