//! Daily streak calculation.
//!
//! Both instants are normalised to UTC calendar days before comparing.

use chrono::{DateTime, Utc};

/// Streak after recording an activity at `now`
///
/// - no previous activity: 1
/// - same calendar day: unchanged
/// - previous calendar day: `current + 1`
/// - two or more days ago: 1
/// - `last` after `now` (clock skew): 1, with a warning
pub fn calculate_streak(current: u32, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last) = last else {
        return 1;
    };

    let days = (now.date_naive() - last.date_naive()).num_days();
    match days {
        0 => current,
        1 => current.saturating_add(1).max(1),
        d if d > 1 => 1,
        _ => {
            tracing::warn!(
                "Last activity {} is after now {}; resetting streak",
                last,
                now
            );
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_activity_starts_at_one() {
        assert_eq!(calculate_streak(0, None, at(10, 12)), 1);
        assert_eq!(calculate_streak(42, None, at(10, 12)), 1);
    }

    #[test]
    fn test_same_day_unchanged() {
        assert_eq!(calculate_streak(5, Some(at(10, 1)), at(10, 23)), 5);
    }

    #[test]
    fn test_consecutive_day_increments() {
        assert_eq!(calculate_streak(5, Some(at(9, 23)), at(10, 0)), 6);
        // A zero streak with a prior date still counts as at least one
        assert_eq!(calculate_streak(0, Some(at(9, 12)), at(10, 12)), 1);
    }

    #[test]
    fn test_calendar_days_not_24h_windows() {
        // 47 hours apart but only one calendar day between
        let last = at(9, 0);
        let now = last + Duration::hours(47);
        assert_eq!(calculate_streak(3, Some(last), now), 4);

        // One hour apart, across midnight
        let late = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 10, 0, 30, 0).unwrap();
        assert_eq!(calculate_streak(3, Some(late), early), 4);
    }

    #[test]
    fn test_gap_resets() {
        assert_eq!(calculate_streak(9, Some(at(7, 12)), at(10, 12)), 1);
    }

    #[test]
    fn test_clock_skew_resets() {
        assert_eq!(calculate_streak(9, Some(at(11, 12)), at(10, 12)), 1);
    }
}
