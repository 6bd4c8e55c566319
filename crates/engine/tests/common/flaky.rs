//! A [`RosterStore`] whose candidate pool can be switched off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

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
use shiftguard_engine::store::{
    MemoryRosterStore, PoolQuery, RosterStore, StoreError, StoreResult,
};

/// Delegates to a [`MemoryRosterStore`]; `candidate_pool` fails while the
/// pool is offline.
pub struct FlakyStore {
    inner: Arc<MemoryRosterStore>,
    pool_offline: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryRosterStore>) -> Self {
        Self {
            inner,
            pool_offline: AtomicBool::new(false),
        }
    }

    pub fn set_pool_offline(&self, offline: bool) {
        self.pool_offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl RosterStore for FlakyStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn create_guard(&self, input: &CreateGuard) -> StoreResult<Guard> {
        self.inner.create_guard(input).await
    }

    async fn find_guard(&self, id: DbId) -> StoreResult<Option<Guard>> {
        self.inner.find_guard(id).await
    }

    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<CandidatePoolRow>> {
        if self.pool_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("candidate pool offline".into()));
        }
        self.inner.candidate_pool(query).await
    }

    async fn create_shift(&self, input: &CreateShift, now: Timestamp) -> StoreResult<Shift> {
        self.inner.create_shift(input, now).await
    }

    async fn find_shift(&self, id: DbId) -> StoreResult<Option<Shift>> {
        self.inner.find_shift(id).await
    }

    async fn list_shifts_for_guard(&self, guard_id: DbId) -> StoreResult<Vec<Shift>> {
        self.inner.list_shifts_for_guard(guard_id).await
    }

    async fn list_overdue_shifts(&self, cutoff: Timestamp) -> StoreResult<Vec<Shift>> {
        self.inner.list_overdue_shifts(cutoff).await
    }

    async fn check_in(
        &self,
        input: &NewAttendance,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<CheckInResult> {
        self.inner.check_in(input, expected, next).await
    }

    async fn check_out(
        &self,
        attendance_id: DbId,
        at: Timestamp,
        complete_shift: bool,
    ) -> StoreResult<CheckOutResult> {
        self.inner.check_out(attendance_id, at, complete_shift).await
    }

    async fn find_attendance(&self, id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        self.inner.find_attendance(id).await
    }

    async fn find_open_attendance(&self, guard_id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        self.inner.find_open_attendance(guard_id).await
    }

    async fn upsert_availability(
        &self,
        guard_id: DbId,
        day: Day,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> StoreResult<AvailabilityEntry> {
        self.inner
            .upsert_availability(guard_id, day, available, reason, now)
            .await
    }

    async fn find_availability(
        &self,
        guard_id: DbId,
        day: Day,
    ) -> StoreResult<Option<AvailabilityEntry>> {
        self.inner.find_availability(guard_id, day).await
    }

    async fn create_replacement_for_no_show(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        self.inner.create_replacement_for_no_show(input).await
    }

    async fn create_follow_up(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        self.inner.create_follow_up(input).await
    }

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<ReplacementOffer>> {
        self.inner.find_offer(id).await
    }

    async fn find_latest_replacement_for_shift(
        &self,
        shift_id: DbId,
    ) -> StoreResult<Option<ReplacementRequest>> {
        self.inner.find_latest_replacement_for_shift(shift_id).await
    }

    async fn list_replacements(
        &self,
        status: Option<ReplacementStatus>,
        limit: i64,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        self.inner.list_replacements(status, limit).await
    }

    async fn list_open_offers_for_guard(
        &self,
        guard_id: DbId,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        self.inner.list_open_offers_for_guard(guard_id).await
    }

    async fn declined_guards_for_shift(&self, shift_id: DbId) -> StoreResult<Vec<DbId>> {
        self.inner.declined_guards_for_shift(shift_id).await
    }

    async fn list_follow_up_due(
        &self,
        now: Timestamp,
        max_rounds: i32,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        self.inner.list_follow_up_due(now, max_rounds).await
    }

    async fn accept_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<AcceptResult> {
        self.inner.accept_replacement(request_id, guard_id, now).await
    }

    async fn decline_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<DeclineResult> {
        self.inner.decline_replacement(request_id, guard_id, now).await
    }

    async fn expire_stale(&self, now: Timestamp) -> StoreResult<Vec<ReplacementRequest>> {
        self.inner.expire_stale(now).await
    }

    async fn mark_notified(&self, request_id: DbId, guard_id: DbId) -> StoreResult<()> {
        self.inner.mark_notified(request_id, guard_id).await
    }

    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification> {
        self.inner.create_notification(input).await
    }

    async fn list_notifications(
        &self,
        guard_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.inner
            .list_notifications(guard_id, unread_only, limit)
            .await
    }

    async fn mark_notification_read(
        &self,
        id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<Notification>> {
        self.inner.mark_notification_read(id, guard_id, now).await
    }
}
