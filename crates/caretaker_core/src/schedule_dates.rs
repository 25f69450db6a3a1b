//! crates/caretaker_core/src/schedule_dates.rs
//!
//! Derives the start and end dates of a reminder from its time of day,
//! weekday set, and course duration.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::domain::ALL_WEEKDAYS;
use crate::ports::PortError;

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Computes `(start_date, end_date)` for a reminder created at `now`.
///
/// Daily reminders (`weekdays` contains the `"all"` sentinel) start today,
/// or tomorrow when the time of day has already passed. Weekday-restricted
/// reminders start on the next listed day, again skipping today when its
/// slot has passed. A bounded course of `n` days ends `n - 1` days after the
/// start; `duration_days == 0` means indefinite (`end_date = None`).
pub fn derive_schedule(
    now: NaiveDateTime,
    time_of_day: NaiveTime,
    weekdays: &[String],
    duration_days: u32,
) -> Result<(NaiveDate, Option<NaiveDate>), PortError> {
    let today = now.date();
    let slot_passed_today = now.time() >= time_of_day;

    let start = if weekdays.iter().any(|d| d == ALL_WEEKDAYS) {
        if slot_passed_today {
            today + Duration::days(1)
        } else {
            today
        }
    } else {
        let wanted: Vec<Weekday> = weekdays
            .iter()
            .filter_map(|d| parse_weekday(d))
            .collect();
        if wanted.is_empty() {
            return Err(PortError::InvalidRecord(format!(
                "no recognizable weekdays in {weekdays:?}"
            )));
        }
        (0..=7)
            .map(|offset| today + Duration::days(offset))
            .find(|candidate| {
                if *candidate == today && slot_passed_today {
                    return false;
                }
                wanted.contains(&candidate.weekday())
            })
            // With at least one valid weekday, a match exists within 8 days.
            .ok_or_else(|| PortError::Unexpected("no start date within a week".to_string()))?
    };

    let end = if duration_days > 0 {
        Some(start + Duration::days(i64::from(duration_days) - 1))
    } else {
        None
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: (i32, u32, u32), hm: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hm.0, hm.1, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn days(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn daily_reminder_starts_today_when_slot_is_ahead() {
        // 2026-03-02 is a Monday.
        let (start, end) =
            derive_schedule(at((2026, 3, 2), (7, 0)), hm(8, 0), &days(&["all"]), 0).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(end, None);
    }

    #[test]
    fn daily_reminder_starts_tomorrow_when_slot_has_passed() {
        let (start, _) =
            derive_schedule(at((2026, 3, 2), (9, 0)), hm(8, 0), &days(&["all"]), 0).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
    }

    #[test]
    fn exact_slot_time_counts_as_passed() {
        let (start, _) =
            derive_schedule(at((2026, 3, 2), (8, 0)), hm(8, 0), &days(&["all"]), 0).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
    }

    #[test]
    fn weekday_reminder_skips_to_next_listed_day() {
        // Monday 09:00, slot 08:00 already gone, list is mon/wed -> Wednesday.
        let (start, _) = derive_schedule(
            at((2026, 3, 2), (9, 0)),
            hm(8, 0),
            &days(&["monday", "wednesday"]),
            0,
        )
        .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn weekday_reminder_can_wrap_a_whole_week() {
        // Monday 09:00, only mondays, slot passed -> next Monday.
        let (start, _) = derive_schedule(
            at((2026, 3, 2), (9, 0)),
            hm(8, 0),
            &days(&["monday"]),
            0,
        )
        .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }

    #[test]
    fn bounded_course_ends_duration_minus_one_after_start() {
        let (start, end) =
            derive_schedule(at((2026, 3, 2), (7, 0)), hm(8, 0), &days(&["all"]), 4).unwrap();
        assert_eq!(end, Some(start + Duration::days(3)));
    }

    #[test]
    fn unknown_weekdays_are_rejected() {
        let err = derive_schedule(
            at((2026, 3, 2), (7, 0)),
            hm(8, 0),
            &days(&["someday"]),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, PortError::InvalidRecord(_)));
    }
}
