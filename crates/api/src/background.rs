//! Engine wiring and background tasks shared by the API server and worker.
//!
//! [`start_engine`] builds the [`Engine`] on top of PostgreSQL and spawns:
//!
//! - event persistence (bus -> `events` table),
//! - the notification worker (queue -> `notifications` table, optional SMS),
//! - the detection/expiry sweeper, when enabled.
//!
//! All tasks stop through one [`CancellationToken`]; see
//! [`BackgroundTasks::shutdown`].

use std::sync::Arc;
use std::time::Duration;

use shiftguard_db::DbPool;
use shiftguard_engine::config::EngineConfig;
use shiftguard_engine::store::{PgRosterStore, RosterStore};
use shiftguard_engine::sweeper::Sweeper;
use shiftguard_engine::Engine;
use shiftguard_events::{
    EventBus, EventPersistence, NotificationDispatcher, NotificationWorker, Notifier, SmsWebhook,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handles of the spawned background tasks.
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundTasks {
    /// Token that stops every task when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel all tasks and wait up to `timeout` for each to finish.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        for (name, handle) in self.handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => tracing::info!(task = name, "Background task stopped"),
                Ok(Err(e)) => tracing::error!(task = name, error = %e, "Background task failed"),
                Err(_) => tracing::warn!(task = name, "Background task did not stop in time"),
            }
        }
    }
}

/// Build the engine against `pool` and spawn its background tasks.
///
/// # Panics
///
/// Panics if the SMS webhook client cannot be built; this runs once at
/// startup.
pub fn start_engine(
    pool: DbPool,
    config: &EngineConfig,
    run_sweeper: bool,
) -> (Arc<Engine>, Arc<EventBus>, BackgroundTasks) {
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    // --- Event bus + persistence ---
    let event_bus = Arc::new(EventBus::default());
    handles.push((
        "event_persistence",
        tokio::spawn(EventPersistence::run(
            pool.clone(),
            event_bus.subscribe(),
            cancel.clone(),
        )),
    ));

    // --- Notification delivery ---
    let (dispatcher, receiver) = NotificationDispatcher::channel(config.notification_queue_capacity);
    let sms = config.sms_webhook_url.as_deref().map(|url| {
        SmsWebhook::new(url).unwrap_or_else(|e| panic!("Failed to build SMS webhook client: {e}"))
    });
    let worker = NotificationWorker::new(pool.clone(), sms);
    handles.push((
        "notification_worker",
        tokio::spawn(worker.run(receiver, cancel.clone())),
    ));

    // --- Engine ---
    let store: Arc<dyn RosterStore> = Arc::new(PgRosterStore::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(dispatcher);
    let engine = Arc::new(Engine::new(
        store,
        config.policy.clone(),
        Arc::clone(&event_bus),
        notifier,
    ));

    // --- Sweeper ---
    if run_sweeper {
        let sweeper = Sweeper::new(Arc::clone(&engine), config.sweep_interval);
        handles.push(("sweeper", tokio::spawn(sweeper.run(cancel.clone()))));
    } else {
        tracing::info!("Sweeper disabled in this process");
    }

    (engine, event_bus, BackgroundTasks { cancel, handles })
}
