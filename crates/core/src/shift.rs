//! Shift state machine and interval helpers.
//!
//! Allowed transitions:
//!
//! ```text
//! scheduled -> in_progress | no_show
//! in_progress -> completed
//! no_show -> replacement_assigned
//! replacement_assigned -> completed
//! ```
//!
//! `replacement_assigned` is terminal for replacement purposes: no further
//! replacement request can be raised once a replacement has been accepted.

use crate::error::CoreError;
use crate::status::ShiftStatus;
use crate::types::Timestamp;

/// Returns the set of statuses reachable from `from`.
pub fn valid_transitions(from: ShiftStatus) -> &'static [ShiftStatus] {
    match from {
        ShiftStatus::Scheduled => &[ShiftStatus::InProgress, ShiftStatus::NoShow],
        ShiftStatus::InProgress => &[ShiftStatus::Completed],
        ShiftStatus::NoShow => &[ShiftStatus::ReplacementAssigned],
        ShiftStatus::ReplacementAssigned => &[ShiftStatus::Completed],
        ShiftStatus::Completed => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: ShiftStatus, to: ShiftStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning an error message for invalid ones.
pub fn validate_transition(from: ShiftStatus, to: ShiftStatus) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!("Invalid shift transition: {from} -> {to}"))
    }
}

/// Statuses in which a shift still occupies its guard's time.
///
/// Used for the "no overlapping active shift" eligibility rule.
pub const ACTIVE_STATUSES: [ShiftStatus; 3] = [
    ShiftStatus::Scheduled,
    ShiftStatus::InProgress,
    ShiftStatus::ReplacementAssigned,
];

/// Whether a shift in `status` counts as occupying its guard.
pub fn is_active(status: ShiftStatus) -> bool {
    ACTIVE_STATUSES.contains(&status)
}

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`.
///
/// Back-to-back shifts (one ends exactly when the next starts) do not overlap.
pub fn intervals_overlap(
    a_start: Timestamp,
    a_end: Timestamp,
    b_start: Timestamp,
    b_end: Timestamp,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Validate the fields of a new shift.
pub fn validate_new_shift(
    start_time: Timestamp,
    end_time: Timestamp,
    client_site: &str,
) -> Result<(), CoreError> {
    if client_site.trim().is_empty() {
        return Err(CoreError::Validation("client_site must not be empty".into()));
    }
    if end_time <= start_time {
        return Err(CoreError::Validation(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn scheduled_to_in_progress_and_no_show() {
        assert!(can_transition(ShiftStatus::Scheduled, ShiftStatus::InProgress));
        assert!(can_transition(ShiftStatus::Scheduled, ShiftStatus::NoShow));
    }

    #[test]
    fn no_show_only_to_replacement_assigned() {
        assert_eq!(
            valid_transitions(ShiftStatus::NoShow),
            &[ShiftStatus::ReplacementAssigned]
        );
    }

    #[test]
    fn completed_is_terminal() {
        assert!(valid_transitions(ShiftStatus::Completed).is_empty());
    }

    #[test]
    fn replacement_assigned_never_returns_to_no_show() {
        assert!(!can_transition(
            ShiftStatus::ReplacementAssigned,
            ShiftStatus::NoShow
        ));
    }

    #[test]
    fn scheduled_cannot_jump_to_replacement_assigned() {
        assert!(!can_transition(
            ShiftStatus::Scheduled,
            ShiftStatus::ReplacementAssigned
        ));
    }

    #[test]
    fn validate_transition_err_names_both_states() {
        let err = validate_transition(ShiftStatus::Completed, ShiftStatus::InProgress).unwrap_err();
        assert!(err.contains("completed"));
        assert!(err.contains("in_progress"));
    }

    // -----------------------------------------------------------------------
    // Intervals
    // -----------------------------------------------------------------------

    #[test]
    fn overlapping_intervals() {
        assert!(intervals_overlap(at(8, 0), at(16, 0), at(15, 0), at(20, 0)));
        assert!(intervals_overlap(at(8, 0), at(16, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn back_to_back_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(8, 0), at(16, 0), at(16, 0), at(23, 0)));
    }

    #[test]
    fn completed_is_not_active() {
        assert!(!is_active(ShiftStatus::Completed));
        assert!(!is_active(ShiftStatus::NoShow));
        assert!(is_active(ShiftStatus::ReplacementAssigned));
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_inverted_window() {
        assert!(validate_new_shift(at(16, 0), at(8, 0), "Dock 4").is_err());
        assert!(validate_new_shift(at(8, 0), at(8, 0), "Dock 4").is_err());
    }

    #[test]
    fn rejects_blank_site() {
        assert!(validate_new_shift(at(8, 0), at(16, 0), "  ").is_err());
    }

    #[test]
    fn accepts_valid_shift() {
        assert!(validate_new_shift(at(8, 0), at(16, 0), "Dock 4").is_ok());
    }
}
