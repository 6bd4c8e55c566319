//! PostgreSQL-backed [`RosterStore`], delegating to the repository layer.

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
use shiftguard_db::repositories::{
    AttendanceRepo, AvailabilityRepo, GuardRepo, NotificationRepo, ReplacementRepo, ShiftRepo,
};
use shiftguard_db::DbPool;

use super::{PoolQuery, RosterStore, StoreResult};

#[derive(Clone)]
pub struct PgRosterStore {
    pool: DbPool,
}

impl PgRosterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(shiftguard_db::health_check(&self.pool).await?)
    }

    async fn create_guard(&self, input: &CreateGuard) -> StoreResult<Guard> {
        Ok(GuardRepo::create(&self.pool, input).await?)
    }

    async fn find_guard(&self, id: DbId) -> StoreResult<Option<Guard>> {
        Ok(GuardRepo::find_by_id(&self.pool, id).await?)
    }

    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<CandidatePoolRow>> {
        Ok(GuardRepo::candidate_pool(
            &self.pool,
            query.shift_id,
            query.start_time,
            query.end_time,
            query.day,
            query.now,
            &query.excluded,
        )
        .await?)
    }

    async fn create_shift(&self, input: &CreateShift, now: Timestamp) -> StoreResult<Shift> {
        Ok(ShiftRepo::create(&self.pool, input, now).await?)
    }

    async fn find_shift(&self, id: DbId) -> StoreResult<Option<Shift>> {
        Ok(ShiftRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_shifts_for_guard(&self, guard_id: DbId) -> StoreResult<Vec<Shift>> {
        Ok(ShiftRepo::list_for_guard(&self.pool, guard_id).await?)
    }

    async fn list_overdue_shifts(&self, cutoff: Timestamp) -> StoreResult<Vec<Shift>> {
        Ok(ShiftRepo::list_overdue(&self.pool, cutoff).await?)
    }

    async fn check_in(
        &self,
        input: &NewAttendance,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<CheckInResult> {
        Ok(AttendanceRepo::check_in(&self.pool, input, expected, next).await?)
    }

    async fn check_out(
        &self,
        attendance_id: DbId,
        at: Timestamp,
        complete_shift: bool,
    ) -> StoreResult<CheckOutResult> {
        Ok(AttendanceRepo::check_out(&self.pool, attendance_id, at, complete_shift).await?)
    }

    async fn find_attendance(&self, id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(AttendanceRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_open_attendance(&self, guard_id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(AttendanceRepo::find_open_for_guard(&self.pool, guard_id).await?)
    }

    async fn upsert_availability(
        &self,
        guard_id: DbId,
        day: Day,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> StoreResult<AvailabilityEntry> {
        Ok(AvailabilityRepo::upsert(&self.pool, guard_id, day, available, reason, now).await?)
    }

    async fn find_availability(
        &self,
        guard_id: DbId,
        day: Day,
    ) -> StoreResult<Option<AvailabilityEntry>> {
        Ok(AvailabilityRepo::find(&self.pool, guard_id, day).await?)
    }

    async fn create_replacement_for_no_show(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        Ok(ReplacementRepo::create_for_no_show(&self.pool, input).await?)
    }

    async fn create_follow_up(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        Ok(ReplacementRepo::create_follow_up(&self.pool, input).await?)
    }

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<ReplacementOffer>> {
        Ok(ReplacementRepo::find_offer(&self.pool, id).await?)
    }

    async fn find_latest_replacement_for_shift(
        &self,
        shift_id: DbId,
    ) -> StoreResult<Option<ReplacementRequest>> {
        Ok(ReplacementRepo::find_latest_for_shift(&self.pool, shift_id).await?)
    }

    async fn list_replacements(
        &self,
        status: Option<ReplacementStatus>,
        limit: i64,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        Ok(ReplacementRepo::list(&self.pool, status, limit).await?)
    }

    async fn list_open_offers_for_guard(
        &self,
        guard_id: DbId,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        Ok(ReplacementRepo::list_open_offers_for_guard(&self.pool, guard_id).await?)
    }

    async fn declined_guards_for_shift(&self, shift_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(ReplacementRepo::declined_guards_for_shift(&self.pool, shift_id).await?)
    }

    async fn list_follow_up_due(
        &self,
        now: Timestamp,
        max_rounds: i32,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        Ok(ReplacementRepo::list_follow_up_due(&self.pool, now, max_rounds).await?)
    }

    async fn accept_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<AcceptResult> {
        Ok(ReplacementRepo::accept(&self.pool, request_id, guard_id, now).await?)
    }

    async fn decline_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<DeclineResult> {
        Ok(ReplacementRepo::decline(&self.pool, request_id, guard_id, now).await?)
    }

    async fn expire_stale(&self, now: Timestamp) -> StoreResult<Vec<ReplacementRequest>> {
        Ok(ReplacementRepo::expire_stale(&self.pool, now).await?)
    }

    async fn mark_notified(&self, request_id: DbId, guard_id: DbId) -> StoreResult<()> {
        Ok(ReplacementRepo::mark_notified(&self.pool, request_id, guard_id).await?)
    }

    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&self.pool, input).await?)
    }

    async fn list_notifications(
        &self,
        guard_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_for_guard(&self.pool, guard_id, unread_only, limit).await?)
    }

    async fn mark_notification_read(
        &self,
        id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::mark_read(&self.pool, id, guard_id, now).await?)
    }
}
