//! In-process [`RosterStore`].
//!
//! All state lives behind one mutex and every trait method runs entirely
//! inside one critical section, so each conditional transition is atomic
//! exactly like its SQL counterpart. The lock is never held across an await.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use shiftguard_core::roles::ROLE_GUARD;
use shiftguard_core::replacement;
use shiftguard_core::shift::{self as shift_rules, intervals_overlap};
use shiftguard_core::status::{ReplacementStatus, ShiftStatus};
use shiftguard_core::types::{Day, DbId, Timestamp};
use shiftguard_db::models::attendance::{
    AttendanceRecord, CheckInResult, CheckOutResult, NewAttendance,
};
use shiftguard_db::models::availability::AvailabilityEntry;
use shiftguard_db::models::guard::{CandidatePoolRow, CreateGuard, Guard};
use shiftguard_db::models::notification::{CreateNotification, Notification};
use shiftguard_db::models::replacement::{
    AcceptResult, DeclineResult, NewReplacementRequest, ReplacementCandidate, ReplacementOffer,
    ReplacementRequest,
};
use shiftguard_db::models::shift::{CreateShift, Shift};

use super::{PoolQuery, RosterStore, StoreError, StoreResult};

#[derive(Default)]
struct Sequences {
    guards: DbId,
    shifts: DbId,
    attendance: DbId,
    availability: DbId,
    requests: DbId,
    candidates: DbId,
    notifications: DbId,
}

fn next(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct State {
    seq: Sequences,
    guards: BTreeMap<DbId, Guard>,
    shifts: BTreeMap<DbId, Shift>,
    attendance: BTreeMap<DbId, AttendanceRecord>,
    availability: BTreeMap<(DbId, Day), AvailabilityEntry>,
    requests: BTreeMap<DbId, ReplacementRequest>,
    /// Candidate lists keyed by request id, in rank order.
    candidates: BTreeMap<DbId, Vec<ReplacementCandidate>>,
    notifications: BTreeMap<DbId, Notification>,
}

/// Whether the request's current status may move to `to`.
fn request_can_move(request: &ReplacementRequest, to: ReplacementStatus) -> bool {
    request
        .status()
        .is_some_and(|from| replacement::can_transition(from, to))
}

/// Whether the shift's current status may move to `to`.
fn shift_can_move(shift: &Shift, to: ShiftStatus) -> bool {
    shift.status().is_some_and(|from| shift_rules::can_transition(from, to))
}

impl State {
    fn has_pending_for_shift(&self, shift_id: DbId) -> bool {
        self.requests
            .values()
            .any(|r| r.original_shift_id == shift_id && r.is_pending())
    }

    fn offer(&self, request: &ReplacementRequest) -> ReplacementOffer {
        ReplacementOffer {
            request: request.clone(),
            candidates: self.candidates.get(&request.id).cloned().unwrap_or_default(),
        }
    }

    fn insert_offer(&mut self, input: &NewReplacementRequest) -> ReplacementOffer {
        let id = next(&mut self.seq.requests);
        let request = ReplacementRequest {
            id,
            original_shift_id: input.original_shift_id,
            original_guard_id: input.original_guard_id,
            client_site: input.client_site.clone(),
            shift_time: input.shift_time,
            status_id: ReplacementStatus::Pending.id(),
            offer_round: input.offer_round,
            accepted_guard_id: None,
            accepted_at: None,
            created_at: input.created_at,
            expires_at: input.expires_at,
            resolved_at: None,
        };

        let mut candidates = Vec::with_capacity(input.candidates.len());
        for (index, candidate) in input.candidates.iter().enumerate() {
            candidates.push(ReplacementCandidate {
                id: next(&mut self.seq.candidates),
                request_id: id,
                rank: index as i32 + 1,
                guard_id: candidate.guard_id,
                guard_name: candidate.guard_name.clone(),
                score: candidate.score,
                notified: false,
                responded: false,
                declined: false,
                responded_at: None,
            });
        }

        self.requests.insert(id, request.clone());
        self.candidates.insert(id, candidates.clone());
        ReplacementOffer {
            request,
            candidates,
        }
    }

    fn pool_row(&self, guard: &Guard, query: &PoolQuery) -> CandidatePoolRow {
        // The replacement, once assigned, occupies the shift instead of the
        // original guard.
        let occupies = |s: &Shift| {
            s.status().is_some_and(shift_rules::is_active)
                && s.replacement_guard_id.unwrap_or(s.guard_id) == guard.id
        };
        let has_overlapping_shift = self.shifts.values().any(|s| {
            s.id != query.shift_id
                && occupies(s)
                && intervals_overlap(s.start_time, s.end_time, query.start_time, query.end_time)
        });

        let total_shifts = self
            .shifts
            .values()
            .filter(|s| {
                (s.guard_id == guard.id || s.replacement_guard_id == Some(guard.id))
                    && !s.has_status(ShiftStatus::Scheduled)
                    && s.start_time <= query.now
            })
            .count() as i64;

        let attended: BTreeSet<DbId> = self
            .attendance
            .values()
            .filter(|a| a.guard_id == guard.id)
            .filter(|a| {
                self.shifts
                    .get(&a.shift_id)
                    .is_some_and(|s| s.start_time <= query.now)
            })
            .map(|a| a.shift_id)
            .collect();

        let last_location = self
            .attendance
            .values()
            .filter(|a| a.guard_id == guard.id && a.latitude.is_some() && a.longitude.is_some())
            .max_by_key(|a| a.check_in_time);

        CandidatePoolRow {
            guard_id: guard.id,
            full_name: guard.full_name.clone(),
            declared_available: self
                .availability
                .get(&(guard.id, query.day))
                .map(|e| e.available),
            has_overlapping_shift,
            total_shifts,
            attended_shifts: attended.len() as i64,
            last_latitude: last_location.and_then(|a| a.latitude),
            last_longitude: last_location.and_then(|a| a.longitude),
        }
    }
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct MemoryRosterStore {
    state: Mutex<State>,
}

impl MemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    // -- guard directory --------------------------------------------------

    async fn create_guard(&self, input: &CreateGuard) -> StoreResult<Guard> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let guard = Guard {
            id: next(&mut state.seq.guards),
            full_name: input.full_name.clone(),
            role: input.role.clone().unwrap_or_else(|| ROLE_GUARD.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.guards.insert(guard.id, guard.clone());
        Ok(guard)
    }

    async fn find_guard(&self, id: DbId) -> StoreResult<Option<Guard>> {
        Ok(self.lock()?.guards.get(&id).cloned())
    }

    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<CandidatePoolRow>> {
        let state = self.lock()?;
        Ok(state
            .guards
            .values()
            .filter(|g| g.is_active && g.role == ROLE_GUARD && !query.excluded.contains(&g.id))
            .map(|g| state.pool_row(g, query))
            .collect())
    }

    // -- shifts -----------------------------------------------------------

    async fn create_shift(&self, input: &CreateShift, now: Timestamp) -> StoreResult<Shift> {
        let mut state = self.lock()?;
        let shift = Shift {
            id: next(&mut state.seq.shifts),
            guard_id: input.guard_id,
            start_time: input.start_time,
            end_time: input.end_time,
            client_site: input.client_site.clone(),
            site_latitude: input.site_latitude,
            site_longitude: input.site_longitude,
            status_id: ShiftStatus::Scheduled.id(),
            replacement_required: false,
            replacement_guard_id: None,
            created_at: now,
            updated_at: now,
        };
        state.shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    async fn find_shift(&self, id: DbId) -> StoreResult<Option<Shift>> {
        Ok(self.lock()?.shifts.get(&id).cloned())
    }

    async fn list_shifts_for_guard(&self, guard_id: DbId) -> StoreResult<Vec<Shift>> {
        let state = self.lock()?;
        let mut shifts: Vec<Shift> = state
            .shifts
            .values()
            .filter(|s| s.guard_id == guard_id || s.replacement_guard_id == Some(guard_id))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(shifts)
    }

    async fn list_overdue_shifts(&self, cutoff: Timestamp) -> StoreResult<Vec<Shift>> {
        let state = self.lock()?;
        let mut shifts: Vec<Shift> = state
            .shifts
            .values()
            .filter(|s| {
                s.has_status(ShiftStatus::Scheduled)
                    && !s.replacement_required
                    && s.start_time <= cutoff
            })
            .cloned()
            .collect();
        shifts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(shifts)
    }

    // -- attendance -------------------------------------------------------

    async fn check_in(
        &self,
        input: &NewAttendance,
        expected: ShiftStatus,
        next_status: ShiftStatus,
    ) -> StoreResult<CheckInResult> {
        let mut state = self.lock()?;

        let in_expected = state
            .shifts
            .get(&input.shift_id)
            .is_some_and(|s| s.has_status(expected));
        if !in_expected {
            return Ok(CheckInResult::ShiftChanged);
        }
        if state
            .attendance
            .values()
            .any(|a| a.guard_id == input.guard_id && a.is_open())
        {
            return Ok(CheckInResult::DuplicateOpen);
        }

        if let Some(shift) = state.shifts.get_mut(&input.shift_id) {
            shift.status_id = next_status.id();
            shift.updated_at = input.check_in_time;
        }

        let record = AttendanceRecord {
            id: next(&mut state.seq.attendance),
            guard_id: input.guard_id,
            shift_id: input.shift_id,
            check_in_time: input.check_in_time,
            check_out_time: None,
            latitude: input.location.map(|p| p.latitude),
            longitude: input.location.map(|p| p.longitude),
            minutes_late: input.minutes_late,
            created_at: input.check_in_time,
            updated_at: input.check_in_time,
        };
        state.attendance.insert(record.id, record.clone());
        Ok(CheckInResult::Recorded(record))
    }

    async fn check_out(
        &self,
        attendance_id: DbId,
        at: Timestamp,
        complete_shift: bool,
    ) -> StoreResult<CheckOutResult> {
        let mut state = self.lock()?;

        let Some(record) = state
            .attendance
            .get_mut(&attendance_id)
            .filter(|a| a.is_open())
        else {
            return Ok(CheckOutResult::AlreadyClosed);
        };
        record.check_out_time = Some(at);
        record.updated_at = at;
        let record = record.clone();

        let mut shift_completed = false;
        if complete_shift {
            if let Some(shift) = state.shifts.get_mut(&record.shift_id) {
                if shift_can_move(shift, ShiftStatus::Completed) {
                    shift.status_id = ShiftStatus::Completed.id();
                    shift.updated_at = at;
                    shift_completed = true;
                }
            }
        }

        Ok(CheckOutResult::Recorded {
            record,
            shift_completed,
        })
    }

    async fn find_attendance(&self, id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self.lock()?.attendance.get(&id).cloned())
    }

    async fn find_open_attendance(&self, guard_id: DbId) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .lock()?
            .attendance
            .values()
            .find(|a| a.guard_id == guard_id && a.is_open())
            .cloned())
    }

    // -- availability -----------------------------------------------------

    async fn upsert_availability(
        &self,
        guard_id: DbId,
        day: Day,
        available: bool,
        reason: Option<&str>,
        now: Timestamp,
    ) -> StoreResult<AvailabilityEntry> {
        let mut state = self.lock()?;
        let existing = state.availability.get(&(guard_id, day)).map(|e| e.id);
        let id = match existing {
            Some(id) => id,
            None => next(&mut state.seq.availability),
        };
        let entry = AvailabilityEntry {
            id,
            guard_id,
            available_on: day,
            available,
            reason: reason.map(str::to_string),
            updated_at: now,
        };
        state.availability.insert((guard_id, day), entry.clone());
        Ok(entry)
    }

    async fn find_availability(
        &self,
        guard_id: DbId,
        day: Day,
    ) -> StoreResult<Option<AvailabilityEntry>> {
        Ok(self.lock()?.availability.get(&(guard_id, day)).cloned())
    }

    // -- replacement requests ---------------------------------------------

    async fn create_replacement_for_no_show(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        let mut state = self.lock()?;

        let claimable = state.shifts.get(&input.original_shift_id).is_some_and(|s| {
            shift_can_move(s, ShiftStatus::NoShow) && !s.replacement_required
        });
        if !claimable || state.has_pending_for_shift(input.original_shift_id) {
            return Ok(None);
        }

        if let Some(shift) = state.shifts.get_mut(&input.original_shift_id) {
            shift.status_id = ShiftStatus::NoShow.id();
            shift.replacement_required = true;
            shift.updated_at = input.created_at;
        }
        Ok(Some(state.insert_offer(input)))
    }

    async fn create_follow_up(
        &self,
        input: &NewReplacementRequest,
    ) -> StoreResult<Option<ReplacementOffer>> {
        let mut state = self.lock()?;

        let still_vacant = state
            .shifts
            .get(&input.original_shift_id)
            .is_some_and(|s| s.has_status(ShiftStatus::NoShow));
        if !still_vacant || state.has_pending_for_shift(input.original_shift_id) {
            return Ok(None);
        }
        Ok(Some(state.insert_offer(input)))
    }

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<ReplacementOffer>> {
        let state = self.lock()?;
        Ok(state.requests.get(&id).map(|r| state.offer(r)))
    }

    async fn find_latest_replacement_for_shift(
        &self,
        shift_id: DbId,
    ) -> StoreResult<Option<ReplacementRequest>> {
        Ok(self
            .lock()?
            .requests
            .values()
            .filter(|r| r.original_shift_id == shift_id)
            .max_by_key(|r| (r.offer_round, r.id))
            .cloned())
    }

    async fn list_follow_up_due(
        &self,
        now: Timestamp,
        max_rounds: i32,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        let state = self.lock()?;
        let mut latest: BTreeMap<DbId, &ReplacementRequest> = BTreeMap::new();
        for request in state.requests.values() {
            let slot = latest.entry(request.original_shift_id).or_insert(request);
            if (request.offer_round, request.id) > (slot.offer_round, slot.id) {
                *slot = request;
            }
        }
        Ok(latest
            .into_values()
            .filter(|r| r.status() == Some(ReplacementStatus::Declined) && r.offer_round < max_rounds)
            .filter(|r| {
                state
                    .shifts
                    .get(&r.original_shift_id)
                    .is_some_and(|s| s.has_status(ShiftStatus::NoShow) && s.end_time > now)
            })
            .cloned()
            .collect())
    }

    async fn list_replacements(
        &self,
        status: Option<ReplacementStatus>,
        limit: i64,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        let state = self.lock()?;
        let mut requests: Vec<ReplacementRequest> = state
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status_id == s.id()))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        requests.truncate(limit.max(0) as usize);
        Ok(requests)
    }

    async fn list_open_offers_for_guard(
        &self,
        guard_id: DbId,
    ) -> StoreResult<Vec<ReplacementRequest>> {
        let state = self.lock()?;
        let mut requests: Vec<ReplacementRequest> = state
            .requests
            .values()
            .filter(|r| r.is_pending())
            .filter(|r| {
                state.candidates.get(&r.id).is_some_and(|list| {
                    list.iter().any(|c| c.guard_id == guard_id && !c.declined)
                })
            })
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn declined_guards_for_shift(&self, shift_id: DbId) -> StoreResult<Vec<DbId>> {
        let state = self.lock()?;
        let declined: BTreeSet<DbId> = state
            .requests
            .values()
            .filter(|r| r.original_shift_id == shift_id)
            .filter_map(|r| state.candidates.get(&r.id))
            .flatten()
            .filter(|c| c.declined)
            .map(|c| c.guard_id)
            .collect();
        Ok(declined.into_iter().collect())
    }

    async fn accept_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<AcceptResult> {
        let mut state = self.lock()?;

        let Some(request) = state.requests.get(&request_id) else {
            return Ok(AcceptResult::NotApplied);
        };
        let open_candidate = state
            .candidates
            .get(&request_id)
            .is_some_and(|list| list.iter().any(|c| c.guard_id == guard_id && !c.declined));
        if !request_can_move(request, ReplacementStatus::Accepted)
            || request.expires_at < now
            || !open_candidate
        {
            return Ok(AcceptResult::NotApplied);
        }

        let shift_id = request.original_shift_id;
        let reassignable = state
            .shifts
            .get(&shift_id)
            .is_some_and(|s| shift_can_move(s, ShiftStatus::ReplacementAssigned));
        if !reassignable {
            return Ok(AcceptResult::ShiftNotReassignable);
        }

        if let Some(shift) = state.shifts.get_mut(&shift_id) {
            shift.status_id = ShiftStatus::ReplacementAssigned.id();
            shift.replacement_guard_id = Some(guard_id);
            shift.updated_at = now;
        }
        if let Some(list) = state.candidates.get_mut(&request_id) {
            for candidate in list.iter_mut().filter(|c| c.guard_id == guard_id) {
                candidate.responded = true;
                candidate.responded_at = Some(now);
            }
        }

        let Some(request) = state.requests.get_mut(&request_id) else {
            return Ok(AcceptResult::NotApplied);
        };
        request.status_id = ReplacementStatus::Accepted.id();
        request.accepted_guard_id = Some(guard_id);
        request.accepted_at = Some(now);
        request.resolved_at = Some(now);
        Ok(AcceptResult::Accepted(request.clone()))
    }

    async fn decline_replacement(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<DeclineResult> {
        let mut state = self.lock()?;

        let live = state
            .requests
            .get(&request_id)
            .is_some_and(|r| {
                request_can_move(r, ReplacementStatus::Declined) && r.expires_at >= now
            });
        if !live {
            return Ok(DeclineResult::NotApplied);
        }

        let Some(list) = state.candidates.get_mut(&request_id) else {
            return Ok(DeclineResult::NotApplied);
        };
        let Some(candidate) = list
            .iter_mut()
            .find(|c| c.guard_id == guard_id && !c.declined)
        else {
            return Ok(DeclineResult::NotApplied);
        };
        candidate.declined = true;
        candidate.responded = true;
        candidate.responded_at = Some(now);

        if list.iter().any(|c| !c.declined) {
            return Ok(DeclineResult::Recorded);
        }

        let Some(request) = state.requests.get_mut(&request_id) else {
            return Ok(DeclineResult::Recorded);
        };
        request.status_id = ReplacementStatus::Declined.id();
        request.resolved_at = Some(now);
        Ok(DeclineResult::AllDeclined(request.clone()))
    }

    async fn expire_stale(&self, now: Timestamp) -> StoreResult<Vec<ReplacementRequest>> {
        let mut state = self.lock()?;
        let mut expired = Vec::new();
        for request in state
            .requests
            .values_mut()
            .filter(|r| request_can_move(r, ReplacementStatus::Expired) && r.expires_at < now)
        {
            request.status_id = ReplacementStatus::Expired.id();
            request.resolved_at = Some(now);
            expired.push(request.clone());
        }
        Ok(expired)
    }

    async fn mark_notified(&self, request_id: DbId, guard_id: DbId) -> StoreResult<()> {
        let mut state = self.lock()?;
        if let Some(list) = state.candidates.get_mut(&request_id) {
            for candidate in list.iter_mut().filter(|c| c.guard_id == guard_id) {
                candidate.notified = true;
            }
        }
        Ok(())
    }

    // -- notifications ----------------------------------------------------

    async fn create_notification(&self, input: &CreateNotification) -> StoreResult<Notification> {
        let mut state = self.lock()?;
        let notification = Notification {
            id: next(&mut state.seq.notifications),
            guard_id: input.guard_id,
            title: input.title.clone(),
            message: input.message.clone(),
            related_shift_id: input.related_shift_id,
            related_request_id: input.related_request_id,
            expires_at: input.expires_at,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        state
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        guard_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        let state = self.lock()?;
        let mut notifications: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.guard_id == guard_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        notifications.truncate(limit.max(0) as usize);
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<Notification>> {
        let mut state = self.lock()?;
        let Some(notification) = state
            .notifications
            .get_mut(&id)
            .filter(|n| n.guard_id == guard_id)
        else {
            return Ok(None);
        };
        notification.is_read = true;
        notification.read_at.get_or_insert(now);
        Ok(Some(notification.clone()))
    }
}
