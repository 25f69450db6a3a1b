//! services/api/src/clock.rs
//!
//! Wall-clock helpers. Reminder time slots are local wall-clock values
//! ("08:00" means eight in the morning where the care recipient lives), so
//! every comparison against the current time goes through the configured
//! timezone, never through UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// The local wall-clock reading of `instant` in `tz`.
pub fn wall_clock(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// The local wall-clock reading of the current moment.
pub fn local_now(tz: Tz) -> NaiveDateTime {
    wall_clock(Utc::now(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caretaker_core::schedule_dates::derive_schedule;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::America::Costa_Rica;

    #[test]
    fn utc_afternoon_is_a_costa_rica_morning() {
        // 13:30 UTC is 07:30 in Costa Rica (UTC-6, no DST).
        let instant = Utc.with_ymd_and_hms(2026, 3, 2, 13, 30, 0).unwrap();
        let local = wall_clock(instant, Costa_Rica);
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(local.time(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn morning_slot_has_not_passed_when_only_utc_says_it_has() {
        // A reminder for 08:00 created at 07:30 local (13:30 UTC) must start
        // the same day; that only holds when "now" is read on the local
        // clock.
        let instant = Utc.with_ymd_and_hms(2026, 3, 2, 13, 30, 0).unwrap();
        let slot = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        let (start, _) = derive_schedule(
            wall_clock(instant, Costa_Rica),
            slot,
            &["all".to_string()],
            0,
        )
        .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        // The UTC reading of the same instant would push the start to
        // tomorrow.
        let (utc_start, _) =
            derive_schedule(instant.naive_utc(), slot, &["all".to_string()], 0).unwrap();
        assert_eq!(utc_start, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
    }
}
