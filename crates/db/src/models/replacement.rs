//! Replacement offer models: the request row, its frozen candidate list,
//! and the outcomes of the conditional transitions.

use serde::Serialize;
use sqlx::FromRow;
use shiftguard_core::status::{ReplacementStatus, StatusId};
use shiftguard_core::types::{DbId, Timestamp};

/// A row from the `replacement_requests` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReplacementRequest {
    pub id: DbId,
    pub original_shift_id: DbId,
    pub original_guard_id: DbId,
    pub client_site: String,
    pub shift_time: Timestamp,
    pub status_id: StatusId,
    pub offer_round: i32,
    pub accepted_guard_id: Option<DbId>,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl ReplacementRequest {
    pub fn status(&self) -> Option<ReplacementStatus> {
        ReplacementStatus::from_id(self.status_id)
    }

    pub fn is_pending(&self) -> bool {
        self.status_id == ReplacementStatus::Pending.id()
    }
}

/// A row from the `replacement_candidates` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReplacementCandidate {
    pub id: DbId,
    pub request_id: DbId,
    pub rank: i32,
    pub guard_id: DbId,
    pub guard_name: String,
    pub score: f64,
    pub notified: bool,
    pub responded: bool,
    pub declined: bool,
    pub responded_at: Option<Timestamp>,
}

/// A request together with its ranked candidate list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementOffer {
    #[serde(flatten)]
    pub request: ReplacementRequest,
    pub candidates: Vec<ReplacementCandidate>,
}

impl ReplacementOffer {
    pub fn candidate(&self, guard_id: DbId) -> Option<&ReplacementCandidate> {
        self.candidates.iter().find(|c| c.guard_id == guard_id)
    }
}

/// Insert payload for one candidate, in rank order.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub guard_id: DbId,
    pub guard_name: String,
    pub score: f64,
}

/// Insert payload for a new pending request and its candidate list.
#[derive(Debug, Clone)]
pub struct NewReplacementRequest {
    pub original_shift_id: DbId,
    pub original_guard_id: DbId,
    pub client_site: String,
    pub shift_time: Timestamp,
    pub offer_round: i32,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub candidates: Vec<NewCandidate>,
}

/// Result of the conditional `pending -> accepted` transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptResult {
    /// This call won; the shift now carries the replacement guard.
    Accepted(ReplacementRequest),
    /// The request was not pending, was past its window, or the guard was
    /// not an open candidate when the update ran.
    NotApplied,
    /// The request was pending but its shift was no longer a no-show.
    ShiftNotReassignable,
}

/// Result of recording a candidate's decline.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclineResult {
    /// Decline stored; other candidates are still outstanding.
    Recorded,
    /// Decline stored and it was the last outstanding candidate; the request
    /// moved to `declined`.
    AllDeclined(ReplacementRequest),
    /// The request was not pending, was past its window, or the guard had
    /// no open candidacy when the update ran.
    NotApplied,
}
