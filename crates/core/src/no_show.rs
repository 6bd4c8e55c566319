//! No-show classification.
//!
//! A shift is a no-show candidate when it is still `scheduled`, its start
//! time plus the grace period has been reached, and it has not already been
//! claimed for replacement. Detection itself is a pure read; claiming is the
//! store's atomic `scheduled -> no_show` transition.

use chrono::Duration;

use crate::status::ShiftStatus;
use crate::types::Timestamp;

/// Latest start time that counts as overdue at `now`.
///
/// A shift is overdue iff `start_time <= detection_cutoff(now, grace)`,
/// i.e. `start_time + grace <= now`.
pub fn detection_cutoff(now: Timestamp, grace: Duration) -> Timestamp {
    now - grace
}

/// Whether a shift with the given state is a no-show at `now`.
pub fn is_no_show(
    status: ShiftStatus,
    start_time: Timestamp,
    replacement_required: bool,
    now: Timestamp,
    grace: Duration,
) -> bool {
    status == ShiftStatus::Scheduled
        && !replacement_required
        && start_time <= detection_cutoff(now, grace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn eight_am() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn grace() -> Duration {
        Duration::minutes(15)
    }

    #[test]
    fn not_flagged_inside_grace_period() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 14, 59).unwrap();
        assert!(!is_no_show(ShiftStatus::Scheduled, eight_am(), false, now, grace()));
    }

    #[test]
    fn flagged_exactly_at_grace_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 15, 0).unwrap();
        assert!(is_no_show(ShiftStatus::Scheduled, eight_am(), false, now, grace()));
    }

    #[test]
    fn flagged_after_grace_period() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 16, 1).unwrap();
        assert!(is_no_show(ShiftStatus::Scheduled, eight_am(), false, now, grace()));
    }

    #[test]
    fn already_claimed_is_never_flagged() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert!(!is_no_show(ShiftStatus::Scheduled, eight_am(), true, now, grace()));
    }

    #[test]
    fn checked_in_shift_is_never_flagged() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert!(!is_no_show(ShiftStatus::InProgress, eight_am(), false, now, grace()));
    }
}
