//! Availability day semantics.
//!
//! Availability is declared per guard per calendar day (UTC). A guard with
//! no entry for a day is treated as available: absence of a record means
//! "nothing declared", not "unavailable".

use crate::types::{Day, Timestamp};

/// Availability assumed when a guard has not declared anything for a day.
pub const DEFAULT_AVAILABLE: bool = true;

/// Truncate a timestamp to its UTC calendar day.
pub fn day_of(ts: Timestamp) -> Day {
    ts.date_naive()
}

/// Resolve a possibly-missing availability entry.
pub fn resolve(entry: Option<bool>) -> bool {
    entry.unwrap_or(DEFAULT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn truncates_time_component() {
        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 59).unwrap();
        assert_eq!(day_of(morning), day_of(night));
        assert_eq!(day_of(morning), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn missing_entry_means_available() {
        assert!(resolve(None));
        assert!(!resolve(Some(false)));
    }
}
