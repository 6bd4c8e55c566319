//! Shared fixtures for engine integration tests.
//!
//! Everything runs against [`MemoryRosterStore`], which applies the same
//! conditional transitions as the Postgres store.

#![allow(dead_code)]

mod flaky;

pub use flaky::FlakyStore;

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::guard::CreateGuard;
use shiftguard_db::models::shift::{CreateShift, Shift};
use shiftguard_engine::store::{MemoryRosterStore, RosterStore};
use shiftguard_engine::Engine;
use shiftguard_events::{EventBus, GuardNotification, NotifyError, Notifier};

pub const SITE: &str = "Harbour Gate 3";

/// Notifier that records every message, or rejects all of them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<GuardNotification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<GuardNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: GuardNotification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Closed);
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<Engine>,
    pub store: Arc<MemoryRosterStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub bus: Arc<EventBus>,
}

pub fn harness() -> Harness {
    harness_with(ReplacementPolicy::default(), RecordingNotifier::default())
}

pub fn harness_with(policy: ReplacementPolicy, notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(MemoryRosterStore::new());
    build(store.clone(), store, policy, notifier)
}

/// Engine running on a [`FlakyStore`] over the harness's memory store.
pub fn flaky_harness(policy: ReplacementPolicy) -> (Harness, Arc<FlakyStore>) {
    let store = Arc::new(MemoryRosterStore::new());
    let flaky = Arc::new(FlakyStore::new(store.clone()));
    let h = build(flaky.clone(), store, policy, RecordingNotifier::default());
    (h, flaky)
}

fn build(
    engine_store: Arc<dyn RosterStore>,
    store: Arc<MemoryRosterStore>,
    policy: ReplacementPolicy,
    notifier: RecordingNotifier,
) -> Harness {
    let notifier = Arc::new(notifier);
    let bus = Arc::new(EventBus::default());
    let engine = Engine::new(
        engine_store,
        policy,
        bus.clone(),
        notifier.clone() as Arc<dyn Notifier>,
    );
    Harness {
        engine: Arc::new(engine),
        store,
        notifier,
        bus,
    }
}

/// 2026-03-02 at the given UTC time.
pub fn at(h: u32, m: u32, s: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
}

/// 2026-03-01 at the given UTC time.
pub fn day_before(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap()
}

pub fn site() -> GeoPoint {
    GeoPoint::new(51.5074, -0.1278)
}

impl Harness {
    pub async fn guard(&self, name: &str) -> DbId {
        self.engine
            .shifts
            .register_guard(&CreateGuard {
                full_name: name.into(),
                role: None,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn guards(&self, names: &[&str]) -> Vec<DbId> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.guard(name).await);
        }
        ids
    }

    pub async fn shift(&self, guard_id: DbId, start: Timestamp, end: Timestamp) -> Shift {
        let site = site();
        self.engine
            .shifts
            .create_shift(
                &CreateShift {
                    guard_id,
                    start_time: start,
                    end_time: end,
                    client_site: SITE.into(),
                    site_latitude: Some(site.latitude),
                    site_longitude: Some(site.longitude),
                },
                start - chrono::Duration::days(2),
            )
            .await
            .unwrap()
    }

    /// The standard 08:00-16:00 day shift.
    pub async fn day_shift(&self, guard_id: DbId) -> Shift {
        self.shift(guard_id, at(8, 0, 0), at(16, 0, 0)).await
    }

    /// Give `guard_id` one fully attended shift on the previous day.
    pub async fn attended_history(&self, guard_id: DbId, location: Option<GeoPoint>) {
        let shift = self
            .shift(guard_id, day_before(8, 0), day_before(16, 0))
            .await;
        let record = self
            .engine
            .attendance
            .check_in(guard_id, shift.id, location, day_before(8, 0))
            .await
            .unwrap();
        self.engine
            .attendance
            .check_out(record.id, day_before(16, 0))
            .await
            .unwrap();
    }

    pub async fn shift_now(&self, shift_id: DbId) -> Shift {
        self.engine.shifts.get_shift(shift_id).await.unwrap()
    }
}
