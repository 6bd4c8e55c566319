//! Replacement orchestration engine.
//!
//! Detects shifts whose guard never checked in, ranks replacement
//! candidates, and runs the offer lifecycle (raise, accept, decline,
//! expire) against a [`RosterStore`]. Every operation takes `now` as an
//! argument; only the [`sweeper`] and the HTTP layer read the wall clock.
//!
//! Consistency rests on the store: claims and acceptances are atomic
//! conditional updates, so any number of engine instances may share one
//! database.

pub mod attendance;
pub mod availability;
pub mod candidates;
pub mod config;
pub mod detector;
pub mod error;
pub mod inbox;
pub mod orchestrator;
pub mod shifts;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_events::{EventBus, Notifier};

pub use error::{EngineError, EngineResult};
pub use store::{RosterStore, StoreError};

use attendance::AttendanceRecorder;
use availability::AvailabilityRegistry;
use candidates::CandidateScorer;
use detector::NoShowDetector;
use inbox::NotificationInbox;
use orchestrator::ReplacementOrchestrator;
use shifts::ShiftService;

/// All engine services wired to one store, policy, bus and notifier.
///
/// Cheap to share behind an `Arc`; each service holds its own handles.
pub struct Engine {
    pub shifts: ShiftService,
    pub attendance: AttendanceRecorder,
    pub availability: AvailabilityRegistry,
    pub detector: NoShowDetector,
    pub replacements: ReplacementOrchestrator,
    pub inbox: NotificationInbox,
    store: Arc<dyn RosterStore>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn RosterStore>,
        policy: ReplacementPolicy,
        bus: Arc<EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let policy = Arc::new(policy);
        let detector = NoShowDetector::new(store.clone(), policy.clone());
        let scorer = CandidateScorer::new(store.clone(), policy.clone());

        Self {
            shifts: ShiftService::new(store.clone(), bus.clone()),
            attendance: AttendanceRecorder::new(store.clone(), policy.clone(), bus.clone()),
            availability: AvailabilityRegistry::new(store.clone()),
            detector: detector.clone(),
            replacements: ReplacementOrchestrator::new(
                store.clone(),
                policy,
                detector,
                scorer,
                bus,
                notifier,
            ),
            inbox: NotificationInbox::new(store.clone()),
            store,
        }
    }

    /// Confirm the backing store is reachable.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}
