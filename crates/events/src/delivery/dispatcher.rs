//! Bounded, non-blocking notification queue.

use tokio::sync::mpsc;

use super::{GuardNotification, NotifyError, Notifier};

/// Default queue depth between the engine and the delivery worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// [`Notifier`] that hands messages to a background worker via `try_send`.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<GuardNotification>,
}

impl NotificationDispatcher {
    /// Create a dispatcher and the receiver its worker should drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<GuardNotification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, notification: GuardNotification) -> Result<(), NotifyError> {
        self.sender.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn message(guard_id: i64) -> GuardNotification {
        GuardNotification {
            guard_id,
            title: "Replacement offer".into(),
            message: "Harbour Gate 3 needs cover".into(),
            related_shift_id: Some(1),
            related_request_id: Some(2),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn delivers_to_receiver() {
        let (dispatcher, mut rx) = NotificationDispatcher::channel(4);
        dispatcher.notify(message(7)).unwrap();
        assert_eq!(rx.recv().await.unwrap().guard_id, 7);
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (dispatcher, _rx) = NotificationDispatcher::channel(1);
        dispatcher.notify(message(1)).unwrap();
        assert_matches!(dispatcher.notify(message(2)), Err(NotifyError::QueueFull));
    }

    #[test]
    fn dropped_worker_reports_closed() {
        let (dispatcher, rx) = NotificationDispatcher::channel(1);
        drop(rx);
        assert_matches!(dispatcher.notify(message(1)), Err(NotifyError::Closed));
    }
}
