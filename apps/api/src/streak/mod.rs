//! Daily activity streaks.
//!
//! Days are compared on the UTC calendar. Recording activity twice on the same
//! day is a no-op; skipping a whole day resets the streak to 1.

pub mod handlers;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakState {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakOutcome {
    Started,
    AlreadyCounted,
    Extended,
    Reset,
}

/// Applies an activity at `now` to `state`.
pub fn compute_streak(state: StreakState, now: DateTime<Utc>) -> (StreakState, StreakOutcome) {
    let today = now.date_naive();

    let Some(last_active_at) = state.last_active_at else {
        return (
            StreakState {
                current_streak: 1,
                longest_streak: state.longest_streak.max(1),
                last_active_at: Some(now),
            },
            StreakOutcome::Started,
        );
    };

    let last_day = last_active_at.date_naive();
    // Same day, or a timestamp from the future (clock skew): nothing to count.
    if last_day >= today {
        return (state, StreakOutcome::AlreadyCounted);
    }

    let (current_streak, outcome) = if is_previous_day(last_day, today) {
        (state.current_streak.saturating_add(1), StreakOutcome::Extended)
    } else {
        (1, StreakOutcome::Reset)
    };

    (
        StreakState {
            current_streak,
            longest_streak: state.longest_streak.max(current_streak),
            last_active_at: Some(now),
        },
        outcome,
    )
}

/// The streak as it should be displayed at `now`: a streak whose last day is
/// before yesterday is already broken and reads as 0.
pub fn effective_streak(state: &StreakState, now: DateTime<Utc>) -> i32 {
    let Some(last_active_at) = state.last_active_at else {
        return 0;
    };
    let last_day = last_active_at.date_naive();
    let today = now.date_naive();
    if last_day >= today || is_previous_day(last_day, today) {
        state.current_streak
    } else {
        0
    }
}

fn is_previous_day(day: NaiveDate, today: NaiveDate) -> bool {
    today - day == Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn state(current: i32, longest: i32, last: Option<DateTime<Utc>>) -> StreakState {
        StreakState {
            current_streak: current,
            longest_streak: longest,
            last_active_at: last,
        }
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let (next, outcome) = compute_streak(state(0, 0, None), at(2024, 3, 1, 9));
        assert_eq!(outcome, StreakOutcome::Started);
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.longest_streak, 1);
        assert_eq!(next.last_active_at, Some(at(2024, 3, 1, 9)));
    }

    #[test]
    fn test_same_day_is_not_counted_twice() {
        let before = state(4, 6, Some(at(2024, 3, 1, 1)));
        let (next, outcome) = compute_streak(before, at(2024, 3, 1, 23));
        assert_eq!(outcome, StreakOutcome::AlreadyCounted);
        assert_eq!(next, before);
    }

    #[test]
    fn test_next_day_extends_even_across_midnight() {
        let (next, outcome) =
            compute_streak(state(4, 4, Some(at(2024, 3, 1, 23))), at(2024, 3, 2, 0));
        assert_eq!(outcome, StreakOutcome::Extended);
        assert_eq!(next.current_streak, 5);
        assert_eq!(next.longest_streak, 5);
    }

    #[test]
    fn test_month_boundary_extends() {
        let (next, outcome) =
            compute_streak(state(2, 9, Some(at(2024, 2, 29, 12))), at(2024, 3, 1, 8));
        assert_eq!(outcome, StreakOutcome::Extended);
        assert_eq!(next.current_streak, 3);
        assert_eq!(next.longest_streak, 9);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let (next, outcome) =
            compute_streak(state(7, 7, Some(at(2024, 3, 1, 12))), at(2024, 3, 3, 12));
        assert_eq!(outcome, StreakOutcome::Reset);
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.longest_streak, 7);
    }

    #[test]
    fn test_future_timestamp_is_ignored() {
        let before = state(3, 3, Some(at(2024, 3, 5, 12)));
        let (next, outcome) = compute_streak(before, at(2024, 3, 4, 12));
        assert_eq!(outcome, StreakOutcome::AlreadyCounted);
        assert_eq!(next, before);
    }

    #[test]
    fn test_effective_streak() {
        let s = state(5, 5, Some(at(2024, 3, 1, 12)));
        assert_eq!(effective_streak(&s, at(2024, 3, 1, 18)), 5);
        assert_eq!(effective_streak(&s, at(2024, 3, 2, 18)), 5);
        assert_eq!(effective_streak(&s, at(2024, 3, 3, 0)), 0);
        assert_eq!(effective_streak(&state(0, 0, None), at(2024, 3, 3, 0)), 0);
    }
}
