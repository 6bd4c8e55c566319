//! The persistent-store seam.
//!
//! [`RosterStore`] is everything the engine needs from durable storage:
//! point lookups, the detection range scan, the scoring snapshot and the
//! atomic conditional transitions. [`PgRosterStore`] is the production
//! implementation; [`MemoryRosterStore`] holds state in process and applies
//! each operation under one lock, which gives the same atomicity for tests
//! and single-node development.

mod memory;
mod pg;

pub use memory::MemoryRosterStore;
pub use pg::PgRosterStore;

use async_trait::async_trait;
use shiftguard_core::status::{ReplacementStatus, ShiftStatus};
use shiftguard_core::types::{Day, DbId, Timestamp};
use shiftguard_db::models::attendance::{
    AttendanceRecord, CheckInResult, CheckOutResult, NewAttendance,
};
use shiftguard_db::models::availability::AvailabilityEntry;
use shiftguard_db::models::guard::{CandidatePoolRow, CreateGuard, Guard};
use shiftguard_db::models::notification::{CreateNotification, Notification};
use shiftguard_db::models::replacement::{
    AcceptResult, DeclineResult, NewReplacementRequest, ReplacementOffer, ReplacementRequest,
};
use shiftguard_db::models::shift::{CreateShift, Shift};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Inputs of the candidate pool snapshot for one vacant shift.
#[derive(Debug, Clone)]
pub struct PoolQuery {
    pub shift_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Calendar day used for the availability lookup.
    pub day: Day,
    /// History cut-off: only shifts started by `now` count toward reliability.
    pub now: Timestamp,
    /// Guards that must not appear (the absent guard, prior decliners).
    pub excluded: Vec<DbId>,
}

#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // -- guard directory --------------------------------------------------

    async fn create_guard(&self, input: &CreateGuard) -> StoreResult<Guard>;
    async fn find_guard(&self, id: DbId) -> StoreResult<Option<Guard>>;

    /// Scoring inputs for every active guard not in `query.excluded`,
    /// ordered by guard id.
    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<CandidatePoolRow>>;

    // -- shifts -----------------------------------------------------------

    async fn create_shift(&self, input: &CreateShift, now: Timestamp) -> StoreResult<Shift>;
    async fn find_shift(&self, id: DbId) -> StoreResult<Option<Shift>>;
    async fn list_shifts_for_guard(&self, guard_id: DbId) -> StoreResult<Vec<Shift>>;

    /// `scheduled`, unclaimed shifts with `start_time <= cutoff`.
    async fn list_overdue_shifts(&self, cutoff: Timestamp) -> StoreResult<Vec<Shift>>;

    // -- attendance -------------------------------------------------------

    /// Insert an open record and move the shift `expected -> next`, atomically.
    async fn check_in(
        &self,
        input: &NewAttendance,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<CheckInResult>;

    /// Close a record; when `complete_shift`, also complete a shift that is
    /// being worked.
    async fn check_out(
        &self,
        attendance_id: DbId,
        at: Timestamp,
        complete_shift: bool,
    ) -> StoreResult<CheckOutResult>;

    async fn find_attendance(&self, id: DbId) -> StoreResult<Option<AttendanceRecord>>;
    async fn find_open_attendance(&self, guard_id: DbId) -> StoreResult<Option<AttendanceRecord>>;

    // -- availability -----------------------------------------------------

    async fn upsert_availability(
        &self,
        guard_id: DbId,
        day: Day,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> StoreResult<AvailabilityEntry>;

    async fn find_availability(
        &self,
        guard_id: DbId,
        day: Day,
    ) -> StoreResult<Option<AvailabilityEntry>>;

    // -- replacement requests ---------------------------------------------

    /// Claim a `scheduled` shift as `no_show` and create its first offer in
    /// one atomic step. `None` when the claim lost.
    async fn create_replacement_for_no_show(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>>;

    /// Create a later offer round for a shift still `no_show`. `None` when
    /// the shift moved on or a pending request already exists.
    async fn create_follow_up(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>>;

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<ReplacementOffer>>;
    async fn find_latest_replacement_for_shift(
        &self,
        shift_id: DbId,
    ) -> StoreResult<Option<ReplacementRequest>>;
    async fn list_replacements(
        &self,
        status: Option<ReplacementStatus>,
        limit: i64,
    ) -> StoreResult<Vec<ReplacementRequest>>;
    async fn list_open_offers_for_guard(
        &self,
        guard_id: DbId,
    ) -> StoreResult<Vec<ReplacementRequest>>;
    async fn declined_guards_for_shift(&self, shift_id: DbId) -> StoreResult<Vec<DbId>>;

    /// Latest request of every `no_show` shift still running at `now` when
    /// that request ended `declined` below `max_rounds`. These are shifts
    /// whose follow-up round was never created.
    async fn list_follow_up_due(
        &self,
        now: Timestamp,
        max_rounds: i32,
    ) -> StoreResult<Vec<ReplacementRequest>>;

    /// Conditional `pending -> accepted` plus the shift hand-over.
    async fn accept_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<AcceptResult>;

    /// Record a decline; the last one moves the request to `declined`.
    async fn decline_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<DeclineResult>;

    /// Conditional `pending -> expired` for every request past its window.
    async fn expire_stale(&self, now: Timestamp) -> StoreResult<Vec<ReplacementRequest>>;

    async fn mark_notified(&self, request_id: DbId, guard_id: DbId) -> StoreResult<()>;

    // -- notifications ----------------------------------------------------

    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification>;
    async fn list_notifications(
        &self,
        guard_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;
    async fn mark_notification_read(
        &self,
        id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<Notification>>;
}
