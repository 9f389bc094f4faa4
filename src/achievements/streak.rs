use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

/// Both streak readings for a member, for profile display.
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Workout timestamps bucketed into calendar days in the member's effective
/// timezone, newest first, one entry per day no matter how many sessions
/// landed on it.
fn activity_days(timestamps: &[DateTime<Utc>], offset: FixedOffset) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = timestamps
        .iter()
        .map(|timestamp| timestamp.with_timezone(&offset).date_naive())
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}

/// All-time best run of consecutive workout days. This is the measure badge
/// criteria compare against.
pub fn longest_streak(timestamps: &[DateTime<Utc>], offset: FixedOffset) -> u32 {
    let days = activity_days(timestamps, offset);
    let mut longest = 0u32;
    let mut run = 0u32;
    for (index, day) in days.iter().enumerate() {
        if index > 0 && days[index - 1] - *day == Duration::days(1) {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }
    longest
}

/// The run the member is still "in" as of `now`: identical consecutive-day
/// grouping, but reported as 0 unless the most recent workout day is today
/// or yesterday. Used for profile displays, not badge awarding.
pub fn current_streak(timestamps: &[DateTime<Utc>], offset: FixedOffset, now: DateTime<Utc>) -> u32 {
    let days = activity_days(timestamps, offset);
    let most_recent = match days.first() {
        Some(day) => *day,
        None => return 0,
    };
    let today = now.with_timezone(&offset).date_naive();
    if today - most_recent > Duration::days(1) {
        return 0;
    }
    let mut run = 1u32;
    for index in 1..days.len() {
        if days[index - 1] - days[index] != Duration::days(1) {
            break;
        }
        run += 1;
    }
    run
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn longest_counts_the_best_consecutive_run() {
        // today, -1, -2, then a gap back to -5
        let timestamps = vec![day(2026, 3, 10), day(2026, 3, 9), day(2026, 3, 8), day(2026, 3, 5)];
        assert_eq!(longest_streak(&timestamps, utc_offset()), 3);
    }

    #[test]
    fn longest_is_zero_with_no_activity() {
        assert_eq!(longest_streak(&[], utc_offset()), 0);
    }

    #[test]
    fn longest_keeps_an_earlier_better_run() {
        let timestamps = vec![
            day(2026, 3, 10),
            day(2026, 3, 4),
            day(2026, 3, 3),
            day(2026, 3, 2),
            day(2026, 3, 1),
        ];
        assert_eq!(longest_streak(&timestamps, utc_offset()), 4);
    }

    #[test]
    fn same_day_sessions_count_once() {
        let timestamps = vec![
            Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, 19, 30, 0).unwrap(),
            day(2026, 3, 9),
        ];
        assert_eq!(longest_streak(&timestamps, utc_offset()), 2);
    }

    #[test]
    fn current_requires_activity_today_or_yesterday() {
        let now = day(2026, 3, 10);
        let active = vec![day(2026, 3, 10), day(2026, 3, 9), day(2026, 3, 8), day(2026, 3, 5)];
        assert_eq!(current_streak(&active, utc_offset(), now), 3);

        let stale = vec![day(2026, 3, 5), day(2026, 3, 4), day(2026, 3, 3)];
        assert_eq!(current_streak(&stale, utc_offset(), now), 0);
    }

    #[test]
    fn current_allows_a_rest_day_today() {
        let now = day(2026, 3, 10);
        let timestamps = vec![day(2026, 3, 9), day(2026, 3, 8)];
        assert_eq!(current_streak(&timestamps, utc_offset(), now), 2);
    }

    #[test]
    fn offset_decides_which_day_a_session_lands_on() {
        // 03:00 UTC is still the previous evening at UTC-5
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let timestamps = vec![
            Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap(),
        ];
        assert_eq!(longest_streak(&timestamps, offset), 1);
    }
}
