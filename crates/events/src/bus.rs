//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`; publishing never blocks and
//! never fails, so a slow or missing subscriber cannot affect the engine.

use serde::{Deserialize, Serialize};
use shiftguard_core::types::{DbId, Timestamp};
use tokio::sync::broadcast;

/// Event names raised by the engine.
pub mod event_types {
    pub const SHIFT_CREATED: &str = "shift.created";
    pub const SHIFT_NO_SHOW: &str = "shift.no_show";
    pub const ATTENDANCE_CHECKED_IN: &str = "attendance.checked_in";
    pub const ATTENDANCE_CHECKED_OUT: &str = "attendance.checked_out";
    pub const REPLACEMENT_RAISED: &str = "replacement.raised";
    pub const REPLACEMENT_ACCEPTED: &str = "replacement.accepted";
    pub const REPLACEMENT_DECLINED: &str = "replacement.declined";
    pub const REPLACEMENT_EXPIRED: &str = "replacement.expired";
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to a shift, attendance record or offer.
///
/// Built with [`DomainEvent::new`] and the `with_*` builder methods. The
/// timestamp is supplied by the caller so events carry the same clock as the
/// operation that raised them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, see [`event_types`].
    pub event_type: String,

    /// Source entity kind (`"shift"`, `"replacement_request"`, ...).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Guard or admin whose action raised the event.
    pub actor_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: Timestamp,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp,
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 16, 0).unwrap()
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            DomainEvent::new(event_types::REPLACEMENT_ACCEPTED, at())
                .with_source("replacement_request", 42)
                .with_actor(7)
                .with_payload(serde_json::json!({"shift_id": 9})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "replacement.accepted");
        assert_eq!(received.source_entity_type.as_deref(), Some("replacement_request"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_id, Some(7));
        assert_eq!(received.payload["shift_id"], 9);
        assert_eq!(received.timestamp, at());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::new(event_types::SHIFT_NO_SHOW, at()));

        assert_eq!(rx1.recv().await.unwrap().event_type, event_types::SHIFT_NO_SHOW);
        assert_eq!(rx2.recv().await.unwrap().event_type, event_types::SHIFT_NO_SHOW);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new(event_types::REPLACEMENT_EXPIRED, at()));
    }
}
