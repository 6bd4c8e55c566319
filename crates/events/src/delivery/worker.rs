//! Background delivery of queued guard notifications.

use shiftguard_db::models::notification::CreateNotification;
use shiftguard_db::repositories::NotificationRepo;
use shiftguard_db::DbPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::sms::SmsWebhook;
use super::GuardNotification;

/// Drains the dispatcher queue: stores each message in the in-app inbox and,
/// when configured, forwards it to the SMS gateway.
pub struct NotificationWorker {
    pool: DbPool,
    sms: Option<SmsWebhook>,
}

impl NotificationWorker {
    pub fn new(pool: DbPool, sms: Option<SmsWebhook>) -> Self {
        Self { pool, sms }
    }

    /// Run until the queue closes or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: mpsc::Receiver<GuardNotification>,
        cancel: CancellationToken,
    ) {
        tracing::info!(sms = self.sms.is_some(), "Notification worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification worker stopping");
                    break;
                }
                next = receiver.recv() => {
                    let Some(notification) = next else {
                        tracing::info!("Notification queue closed, worker shutting down");
                        break;
                    };
                    self.handle(&notification).await;
                }
            }
        }
    }

    async fn handle(&self, notification: &GuardNotification) {
        let input = CreateNotification {
            guard_id: notification.guard_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            related_shift_id: notification.related_shift_id,
            related_request_id: notification.related_request_id,
            expires_at: notification.expires_at,
        };
        if let Err(e) = NotificationRepo::create(&self.pool, &input).await {
            tracing::error!(
                error = %e,
                guard_id = notification.guard_id,
                "Failed to store notification"
            );
        }

        if let Some(sms) = &self.sms {
            // Failures are logged inside `deliver`.
            let _ = sms.deliver(notification).await;
        }
    }
}
