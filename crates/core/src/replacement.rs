//! Replacement offer state machine and response checks.
//!
//! ```text
//! pending -> accepted   first durable acceptance before expires_at
//! pending -> expired    expires_at passed with no acceptance
//! pending -> declined   every candidate declined
//! ```
//!
//! All three targets are terminal. The checks in this module only classify a
//! response against a snapshot of the offer; the authoritative decision is
//! the store's conditional `pending -> *` update.

use chrono::Duration;

use crate::status::ReplacementStatus;
use crate::types::Timestamp;

/// Returns the set of statuses reachable from `from`.
pub fn valid_transitions(from: ReplacementStatus) -> &'static [ReplacementStatus] {
    match from {
        ReplacementStatus::Pending => &[
            ReplacementStatus::Accepted,
            ReplacementStatus::Expired,
            ReplacementStatus::Declined,
        ],
        ReplacementStatus::Accepted | ReplacementStatus::Expired | ReplacementStatus::Declined => {
            &[]
        }
    }
}

pub fn can_transition(from: ReplacementStatus, to: ReplacementStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub fn is_terminal(status: ReplacementStatus) -> bool {
    valid_transitions(status).is_empty()
}

/// Expiry instant for an offer raised at `now`.
pub fn expires_at(now: Timestamp, window: Duration) -> Timestamp {
    now + window
}

/// An offer is expired strictly after `expires_at`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now > expires_at
}

/// A candidate's position on an offer, as far as response checks care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// The guard is not on the candidate list.
    Absent,
    /// On the list and has not responded.
    Open,
    /// On the list and has already declined.
    Declined,
}

/// Why a candidate response cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRejection {
    /// The offer is no longer pending.
    AlreadyResolved,
    /// The guard is not on the candidate list.
    NotACandidate,
    /// The offer window has passed (possibly not yet swept).
    Expired,
    /// The guard declined earlier and cannot accept.
    CandidateDeclined,
}

/// Classify an acceptance attempt.
///
/// Order of checks: status, membership, expiry, prior decline. Expiry is
/// checked lazily here so an unswept offer past `expires_at` still rejects.
pub fn check_acceptance(
    status: ReplacementStatus,
    expires_at: Timestamp,
    candidate: CandidateState,
    now: Timestamp,
) -> Result<(), ResponseRejection> {
    if is_terminal(status) {
        return Err(ResponseRejection::AlreadyResolved);
    }
    if candidate == CandidateState::Absent {
        return Err(ResponseRejection::NotACandidate);
    }
    if is_expired(expires_at, now) {
        return Err(ResponseRejection::Expired);
    }
    if candidate == CandidateState::Declined {
        return Err(ResponseRejection::CandidateDeclined);
    }
    Ok(())
}

/// Classify a decline. A repeated decline by the same guard is accepted as a
/// no-op, so this returns `Ok(false)` for it and `Ok(true)` for a first decline.
pub fn check_decline(
    status: ReplacementStatus,
    expires_at: Timestamp,
    candidate: CandidateState,
    now: Timestamp,
) -> Result<bool, ResponseRejection> {
    if is_terminal(status) {
        return Err(ResponseRejection::AlreadyResolved);
    }
    match candidate {
        CandidateState::Absent => Err(ResponseRejection::NotACandidate),
        _ if is_expired(expires_at, now) => Err(ResponseRejection::Expired),
        CandidateState::Declined => Ok(false),
        CandidateState::Open => Ok(true),
    }
}

/// Whether a follow-up offer may be raised after offer `round` was fully declined.
pub fn may_reoffer(round: i32, reoffer_enabled: bool, max_rounds: i32) -> bool {
    reoffer_enabled && round < max_rounds
}
