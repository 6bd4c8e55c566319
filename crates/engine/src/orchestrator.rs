//! Replacement orchestrator.
//!
//! ```text
//! detect -> claim shift + create offer (atomic) -> notify candidates
//!        -> accept  (first conditional pending->accepted wins, shift reassigned)
//!        -> decline (last one: pending->declined, optional follow-up round)
//!        -> expire  (sweep: pending->expired past expires_at)
//!        -> retry   (sweep: follow-up rounds a failed decline never raised)
//! ```
//!
//! The pre-checks here only classify requests into typed errors; the store's
//! conditional updates decide every race. When an update does not apply, the
//! request is re-read and the loser gets the error describing why.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use shiftguard_core::no_show::is_no_show;
use shiftguard_core::policy::ReplacementPolicy;
use shiftguard_core::replacement::{
    check_acceptance, check_decline, expires_at, may_reoffer, CandidateState, ResponseRejection,
};
use shiftguard_core::scoring::ScoredCandidate;
use shiftguard_core::shift::validate_transition;
use shiftguard_core::status::{ReplacementStatus, ShiftStatus};
use shiftguard_core::types::{DbId, Timestamp};
use shiftguard_db::models::replacement::{
    AcceptResult, DeclineResult, NewCandidate, NewReplacementRequest, ReplacementOffer,
    ReplacementRequest,
};
use shiftguard_db::models::shift::Shift;
use shiftguard_events::{event_types, DomainEvent, EventBus, GuardNotification, Notifier};

use crate::candidates::CandidateScorer;
use crate::detector::NoShowDetector;
use crate::error::{EngineError, EngineResult};
use crate::store::RosterStore;

/// Default page size for request listings.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of raising a replacement for a shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "offer", rename_all = "snake_case")]
pub enum RaiseOutcome {
    /// This call claimed the shift and created the offer.
    Raised(ReplacementOffer),
    /// The shift had already been claimed; this is its latest offer.
    Existing(ReplacementOffer),
}

impl RaiseOutcome {
    pub fn offer(&self) -> &ReplacementOffer {
        match self {
            RaiseOutcome::Raised(offer) | RaiseOutcome::Existing(offer) => offer,
        }
    }

    pub fn into_offer(self) -> ReplacementOffer {
        match self {
            RaiseOutcome::Raised(offer) | RaiseOutcome::Existing(offer) => offer,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, RaiseOutcome::Raised(_))
    }
}

/// Result of a candidate declining.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeclineOutcome {
    /// Decline stored; other candidates are still outstanding.
    Recorded,
    /// The guard had already declined; nothing changed.
    AlreadyDeclined,
    /// Every candidate has now declined and the request is `declined`.
    AllDeclined {
        request: ReplacementRequest,
        follow_up: Option<ReplacementOffer>,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct ReplacementOrchestrator {
    store: Arc<dyn RosterStore>,
    policy: Arc<ReplacementPolicy>,
    detector: NoShowDetector,
    scorer: CandidateScorer,
    bus: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
}

impl ReplacementOrchestrator {
    pub fn new(
        store: Arc<dyn RosterStore>,
        policy: Arc<ReplacementPolicy>,
        detector: NoShowDetector,
        scorer: CandidateScorer,
        bus: Arc<EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            policy,
            detector,
            scorer,
            bus,
            notifier,
        }
    }

    // -----------------------------------------------------------------------
    // Raising offers
    // -----------------------------------------------------------------------

    /// Detect no-shows at `now` and raise an offer for each.
    ///
    /// Returns only the offers this call created; shifts claimed concurrently
    /// by another caller, or checked in to between detection and claim, are
    /// skipped.
    pub async fn detect_and_raise(&self, now: Timestamp) -> EngineResult<Vec<ReplacementOffer>> {
        let overdue = self.detector.detect(now).await?;
        let mut raised = Vec::new();

        for shift in overdue {
            match self.raise_for_shift(&shift, now).await {
                Ok(RaiseOutcome::Raised(offer)) => raised.push(offer),
                Ok(RaiseOutcome::Existing(_)) => {}
                Err(EngineError::InvalidState(reason)) => {
                    tracing::debug!(shift_id = shift.id, %reason, "Skipped overdue shift");
                }
                Err(e) => return Err(e),
            }
        }

        if !raised.is_empty() {
            tracing::info!(count = raised.len(), "Replacement offers raised");
        }
        Ok(raised)
    }

    /// Raise (or return the existing) replacement for one shift.
    ///
    /// Idempotent: once the shift is claimed, later calls return its latest
    /// offer instead of creating another. The one exception is a claimed
    /// shift whose latest round was fully declined without a follow-up; that
    /// round is raised here if policy allows and candidates remain.
    pub async fn raise_replacement(
        &self,
        shift_id: DbId,
        now: Timestamp,
    ) -> EngineResult<RaiseOutcome> {
        let shift = self
            .store
            .find_shift(shift_id)
            .await?
            .ok_or(EngineError::not_found("shift", shift_id))?;
        self.raise_for_shift(&shift, now).await
    }

    async fn raise_for_shift(&self, shift: &Shift, now: Timestamp) -> EngineResult<RaiseOutcome> {
        if shift.replacement_required {
            if let Some(offer) = self.resume_declined(shift, now).await? {
                return Ok(RaiseOutcome::Raised(offer));
            }
            return self.existing_for(shift.id).await;
        }

        let status = shift.status().ok_or_else(|| {
            EngineError::InvalidState(format!("Shift {} has unknown status", shift.id))
        })?;
        validate_transition(status, ShiftStatus::NoShow).map_err(EngineError::InvalidState)?;
        if !is_no_show(
            status,
            shift.start_time,
            shift.replacement_required,
            now,
            self.policy.grace_period(),
        ) {
            return Err(EngineError::InvalidState(format!(
                "Grace period for shift {} has not elapsed",
                shift.id
            )));
        }

        let ranked = self.scorer.rank(shift, &[], now).await?;
        let input = self.new_request(shift, ranked, 1, now);

        let Some(offer) = self.store.create_replacement_for_no_show(&input).await? else {
            // Lost the claim: another caller raised it, or the guard checked in.
            return self.existing_for(shift.id).await;
        };

        tracing::info!(
            shift_id = shift.id,
            request_id = offer.request.id,
            guard_id = shift.guard_id,
            candidates = offer.candidates.len(),
            expires_at = %offer.request.expires_at,
            "Shift flagged as no-show, replacement raised"
        );
        self.bus.publish(
            DomainEvent::new(event_types::SHIFT_NO_SHOW, now)
                .with_source("shift", shift.id)
                .with_payload(json!({ "guard_id": shift.guard_id })),
        );
        self.publish_raised(&offer, now);
        self.notify_candidates(&offer).await;

        Ok(RaiseOutcome::Raised(offer))
    }

    async fn existing_for(&self, shift_id: DbId) -> EngineResult<RaiseOutcome> {
        let latest = self
            .store
            .find_latest_replacement_for_shift(shift_id)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidState(format!("Shift {shift_id} is no longer scheduled"))
            })?;
        let offer = self.get_offer(latest.id).await?;
        Ok(RaiseOutcome::Existing(offer))
    }

    fn new_request(
        &self,
        shift: &Shift,
        ranked: Vec<ScoredCandidate>,
        offer_round: i32,
        now: Timestamp,
    ) -> NewReplacementRequest {
        NewReplacementRequest {
            original_shift_id: shift.id,
            original_guard_id: shift.guard_id,
            client_site: shift.client_site.clone(),
            shift_time: shift.start_time,
            offer_round,
            created_at: now,
            expires_at: expires_at(now, self.policy.offer_expiry()),
            candidates: ranked
                .into_iter()
                .map(|c| NewCandidate {
                    guard_id: c.guard_id,
                    guard_name: c.guard_name,
                    score: c.score,
                })
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------------

    /// Accept an offer on behalf of `guard_id`.
    ///
    /// At most one acceptance per request succeeds; every other caller gets
    /// [`EngineError::AlreadyResolved`] (or the more specific reason their
    /// attempt was invalid).
    pub async fn accept(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> EngineResult<ReplacementRequest> {
        let offer = self.get_offer(request_id).await?;
        classify_acceptance(&offer, guard_id, now)?;

        match self.store.accept_replacement(request_id, guard_id, now).await? {
            AcceptResult::Accepted(request) => {
                tracing::info!(
                    request_id,
                    guard_id,
                    shift_id = request.original_shift_id,
                    "Replacement accepted"
                );
                self.bus.publish(
                    DomainEvent::new(event_types::REPLACEMENT_ACCEPTED, now)
                        .with_source("replacement_request", request_id)
                        .with_actor(guard_id)
                        .with_payload(json!({ "shift_id": request.original_shift_id })),
                );
                self.dispatch(GuardNotification {
                    guard_id,
                    title: "Replacement confirmed".into(),
                    message: format!(
                        "You are assigned to {} starting {}.",
                        request.client_site, request.shift_time
                    ),
                    related_shift_id: Some(request.original_shift_id),
                    related_request_id: Some(request_id),
                    expires_at: None,
                });
                Ok(request)
            }
            AcceptResult::NotApplied => {
                tracing::info!(request_id, guard_id, "Replacement acceptance lost");
                let offer = self.get_offer(request_id).await?;
                classify_acceptance(&offer, guard_id, now)?;
                Err(EngineError::AlreadyResolved { request_id })
            }
            AcceptResult::ShiftNotReassignable => {
                tracing::warn!(
                    request_id,
                    shift_id = offer.request.original_shift_id,
                    "Shift no longer a no-show; acceptance rolled back"
                );
                Err(EngineError::InvalidState(format!(
                    "Shift {} can no longer be reassigned",
                    offer.request.original_shift_id
                )))
            }
        }
    }

    /// Record `guard_id` declining an offer.
    pub async fn decline(
        &self,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> EngineResult<DeclineOutcome> {
        let offer = self.get_offer(request_id).await?;
        if !classify_decline(&offer, guard_id, now)? {
            return Ok(DeclineOutcome::AlreadyDeclined);
        }

        let outcome = match self.store.decline_replacement(request_id, guard_id, now).await? {
            DeclineResult::Recorded => DeclineOutcome::Recorded,
            DeclineResult::AllDeclined(request) => {
                tracing::info!(
                    request_id,
                    shift_id = request.original_shift_id,
                    offer_round = request.offer_round,
                    "Every candidate declined"
                );
                let follow_up = self.follow_up(&request, now).await;
                DeclineOutcome::AllDeclined { request, follow_up }
            }
            DeclineResult::NotApplied => {
                let offer = self.get_offer(request_id).await?;
                return match classify_decline(&offer, guard_id, now)? {
                    false => Ok(DeclineOutcome::AlreadyDeclined),
                    true => Err(EngineError::AlreadyResolved { request_id }),
                };
            }
        };

        tracing::info!(request_id, guard_id, "Replacement declined");
        self.bus.publish(
            DomainEvent::new(event_types::REPLACEMENT_DECLINED, now)
                .with_source("replacement_request", request_id)
                .with_actor(guard_id)
                .with_payload(json!({
                    "all_declined": matches!(outcome, DeclineOutcome::AllDeclined { .. }),
                })),
        );
        Ok(outcome)
    }

    /// Raise the next offer round after `declined` was fully declined.
    ///
    /// The decline itself is already committed, so failures here are logged
    /// rather than returned. The shift stays `no_show` with a declined latest
    /// request, which [`Self::retry_follow_ups`] picks up on the next sweep.
    async fn follow_up(
        &self,
        declined: &ReplacementRequest,
        now: Timestamp,
    ) -> Option<ReplacementOffer> {
        if !self.may_follow_up(declined) {
            tracing::info!(
                request_id = declined.id,
                offer_round = declined.offer_round,
                "No follow-up offer (re-offer disabled or round limit reached)"
            );
            return None;
        }

        match self.try_follow_up(declined, now).await {
            Ok(offer) => offer,
            Err(e) => {
                tracing::error!(
                    request_id = declined.id,
                    error = %e,
                    "Failed to raise follow-up offer; the next sweep retries"
                );
                None
            }
        }
    }

    /// Raise the follow-up round for every running no-show whose latest
    /// request was fully declined but never followed up.
    ///
    /// Idempotent: the store refuses a second pending request per shift, so
    /// overlapping sweeps and a concurrent decline cannot double-raise.
    pub async fn retry_follow_ups(&self, now: Timestamp) -> EngineResult<Vec<ReplacementOffer>> {
        if !self.policy.reoffer_on_all_declined {
            return Ok(Vec::new());
        }

        let due = self
            .store
            .list_follow_up_due(now, self.policy.max_offer_rounds)
            .await?;
        let mut raised = Vec::new();
        for declined in due {
            if let Some(offer) = self.try_follow_up(&declined, now).await? {
                raised.push(offer);
            }
        }

        if !raised.is_empty() {
            tracing::info!(count = raised.len(), "Missed follow-up offers raised");
        }
        Ok(raised)
    }

    /// Follow up a claimed shift whose latest request ended `declined`.
    async fn resume_declined(
        &self,
        shift: &Shift,
        now: Timestamp,
    ) -> EngineResult<Option<ReplacementOffer>> {
        let Some(latest) = self.store.find_latest_replacement_for_shift(shift.id).await? else {
            return Ok(None);
        };
        if latest.status() != Some(ReplacementStatus::Declined) || !self.may_follow_up(&latest) {
            return Ok(None);
        }
        self.raise_follow_up(shift, &latest, now).await
    }

    fn may_follow_up(&self, declined: &ReplacementRequest) -> bool {
        may_reoffer(
            declined.offer_round,
            self.policy.reoffer_on_all_declined,
            self.policy.max_offer_rounds,
        )
    }

    async fn try_follow_up(
        &self,
        declined: &ReplacementRequest,
        now: Timestamp,
    ) -> EngineResult<Option<ReplacementOffer>> {
        let Some(shift) = self.store.find_shift(declined.original_shift_id).await? else {
            return Ok(None);
        };
        self.raise_follow_up(&shift, declined, now).await
    }

    async fn raise_follow_up(
        &self,
        shift: &Shift,
        declined: &ReplacementRequest,
        now: Timestamp,
    ) -> EngineResult<Option<ReplacementOffer>> {
        if !shift.has_status(ShiftStatus::NoShow) || now >= shift.end_time {
            return Ok(None);
        }

        let excluded = self.store.declined_guards_for_shift(shift.id).await?;
        let ranked = self.scorer.rank(shift, &excluded, now).await?;
        if ranked.is_empty() {
            tracing::info!(shift_id = shift.id, "No remaining candidates for follow-up offer");
            return Ok(None);
        }

        let input = self.new_request(shift, ranked, declined.offer_round + 1, now);
        let Some(offer) = self.store.create_follow_up(&input).await? else {
            return Ok(None);
        };

        tracing::info!(
            shift_id = shift.id,
            request_id = offer.request.id,
            offer_round = offer.request.offer_round,
            candidates = offer.candidates.len(),
            "Follow-up replacement raised"
        );
        self.publish_raised(&offer, now);
        self.notify_candidates(&offer).await;
        Ok(Some(offer))
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    /// Expire every pending request past its window. Idempotent.
    pub async fn expire_stale(&self, now: Timestamp) -> EngineResult<Vec<ReplacementRequest>> {
        let expired = self.store.expire_stale(now).await?;
        for request in &expired {
            self.bus.publish(
                DomainEvent::new(event_types::REPLACEMENT_EXPIRED, now)
                    .with_source("replacement_request", request.id)
                    .with_payload(json!({ "shift_id": request.original_shift_id })),
            );
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Replacement requests expired");
        }
        Ok(expired)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_offer(&self, request_id: DbId) -> EngineResult<ReplacementOffer> {
        self.store
            .find_offer(request_id)
            .await?
            .ok_or(EngineError::not_found("replacement request", request_id))
    }

    pub async fn list(
        &self,
        status: Option<ReplacementStatus>,
        limit: Option<i64>,
    ) -> EngineResult<Vec<ReplacementRequest>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 1000);
        Ok(self.store.list_replacements(status, limit).await?)
    }

    /// Pending offers on which the guard may still respond.
    pub async fn open_offers_for_guard(
        &self,
        guard_id: DbId,
    ) -> EngineResult<Vec<ReplacementRequest>> {
        Ok(self.store.list_open_offers_for_guard(guard_id).await?)
    }

    // -----------------------------------------------------------------------
    // Notifications and events
    // -----------------------------------------------------------------------

    fn publish_raised(&self, offer: &ReplacementOffer, now: Timestamp) {
        let candidates: Vec<DbId> = offer.candidates.iter().map(|c| c.guard_id).collect();
        self.bus.publish(
            DomainEvent::new(event_types::REPLACEMENT_RAISED, now)
                .with_source("replacement_request", offer.request.id)
                .with_payload(json!({
                    "shift_id": offer.request.original_shift_id,
                    "offer_round": offer.request.offer_round,
                    "candidates": candidates,
                    "expires_at": offer.request.expires_at,
                })),
        );
    }

    /// Offer notification to every candidate in rank order.
    ///
    /// `notified` is set once dispatch was attempted, whether or not the
    /// hand-off succeeded.
    async fn notify_candidates(&self, offer: &ReplacementOffer) {
        let request = &offer.request;
        for candidate in &offer.candidates {
            self.dispatch(GuardNotification {
                guard_id: candidate.guard_id,
                title: "Replacement shift available".into(),
                message: format!(
                    "Cover needed at {} starting {}. Respond before {}.",
                    request.client_site, request.shift_time, request.expires_at
                ),
                related_shift_id: Some(request.original_shift_id),
                related_request_id: Some(request.id),
                expires_at: Some(request.expires_at),
            });

            if let Err(e) = self.store.mark_notified(request.id, candidate.guard_id).await {
                tracing::warn!(
                    request_id = request.id,
                    guard_id = candidate.guard_id,
                    error = %e,
                    "Failed to flag candidate as notified"
                );
            }
        }
    }

    fn dispatch(&self, notification: GuardNotification) {
        let guard_id = notification.guard_id;
        match self.notifier.notify(notification) {
            Ok(()) => tracing::debug!(guard_id, "Notification dispatched"),
            Err(e) => tracing::warn!(guard_id, error = %e, "Notification dispatch failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn candidate_state(offer: &ReplacementOffer, guard_id: DbId) -> CandidateState {
    match offer.candidate(guard_id) {
        None => CandidateState::Absent,
        Some(c) if c.declined => CandidateState::Declined,
        Some(_) => CandidateState::Open,
    }
}

fn offer_status(offer: &ReplacementOffer) -> EngineResult<ReplacementStatus> {
    offer.request.status().ok_or_else(|| {
        EngineError::InvalidState(format!(
            "Replacement request {} has unknown status",
            offer.request.id
        ))
    })
}

fn classify_acceptance(
    offer: &ReplacementOffer,
    guard_id: DbId,
    now: Timestamp,
) -> EngineResult<()> {
    check_acceptance(
        offer_status(offer)?,
        offer.request.expires_at,
        candidate_state(offer, guard_id),
        now,
    )
    .map_err(|r| rejection_error(r, offer.request.id, guard_id))
}

/// `Ok(true)` for a first decline, `Ok(false)` for a repeat.
fn classify_decline(offer: &ReplacementOffer, guard_id: DbId, now: Timestamp) -> EngineResult<bool> {
    check_decline(
        offer_status(offer)?,
        offer.request.expires_at,
        candidate_state(offer, guard_id),
        now,
    )
    .map_err(|r| rejection_error(r, offer.request.id, guard_id))
}

fn rejection_error(rejection: ResponseRejection, request_id: DbId, guard_id: DbId) -> EngineError {
    match rejection {
        ResponseRejection::AlreadyResolved => EngineError::AlreadyResolved { request_id },
        ResponseRejection::NotACandidate => EngineError::NotACandidate {
            request_id,
            guard_id,
        },
        ResponseRejection::Expired => EngineError::Expired { request_id },
        ResponseRejection::CandidateDeclined => EngineError::InvalidState(format!(
            "Guard {guard_id} already declined replacement request {request_id}"
        )),
    }
}
