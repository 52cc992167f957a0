// Date utility functions
// Calendar-day boundaries in the display time zone

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::utils::time_math::MINUTES_PER_DAY;

/// Calendar day an instant falls on in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// First instant of `day` in `tz`.
///
/// Zones that skip local midnight on a DST change start the day at the first
/// valid local time instead.
pub fn start_of_day(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hour| {
            tz.from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

pub fn end_of_day(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    start_of_day(day + Duration::days(1), tz)
}

/// Instant for a minute offset from `day`'s start.
///
/// Offsets outside `[0, 1440)` roll into neighbouring days, so `-30` is
/// 23:30 on the previous day and `1470` is 00:30 on the next. Within a day
/// minutes count elapsed time from the day start, matching [`minute_of_day`].
pub fn instant_at(day: NaiveDate, minute: i64, tz: Tz) -> DateTime<Utc> {
    let day_shift = minute.div_euclid(MINUTES_PER_DAY);
    let minute_of_day = minute.rem_euclid(MINUTES_PER_DAY);
    start_of_day(day + Duration::days(day_shift), tz) + Duration::minutes(minute_of_day)
}

/// Fractional minutes from `day`'s local midnight to `instant` (may be
/// negative or exceed one day).
pub fn minute_of_day(instant: DateTime<Utc>, day: NaiveDate, tz: Tz) -> f64 {
    let offset = instant - start_of_day(day, tz);
    offset.num_milliseconds() as f64 / 60_000.0
}

/// Every calendar day touched by `[start, end)`, in order.
pub fn days_touched(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> Vec<NaiveDate> {
    let first = local_date(start, tz);
    if end <= start {
        return vec![first];
    }
    // The end bound is exclusive: an entry ending at midnight does not touch
    // the following day.
    let last = local_date(end - Duration::milliseconds(1), tz);
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, Europe, UTC};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_and_end_of_day_utc() {
        let start = start_of_day(day(2025, 1, 1), UTC);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end_of_day(day(2025, 1, 1), UTC) - start, Duration::hours(24));
    }

    #[test]
    fn test_dst_day_is_short() {
        // Europe/Berlin springs forward on 2025-03-30.
        let d = day(2025, 3, 30);
        assert_eq!(
            end_of_day(d, Europe::Berlin) - start_of_day(d, Europe::Berlin),
            Duration::hours(23)
        );
    }

    #[test]
    fn test_instant_at_rolls_days() {
        let d = day(2025, 6, 10);
        assert_eq!(instant_at(d, -30, UTC), Utc.with_ymd_and_hms(2025, 6, 9, 23, 30, 0).unwrap());
        assert_eq!(instant_at(d, 1470, UTC), Utc.with_ymd_and_hms(2025, 6, 11, 0, 30, 0).unwrap());
        assert_eq!(instant_at(d, 1440, UTC), Utc.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_instant_at_respects_zone() {
        let d = day(2025, 1, 15);
        // New York is UTC-5 in January.
        let instant = instant_at(d, 9 * 60, America::New_York);
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 1, 15, 14, 0, 0).unwrap());
        assert!((minute_of_day(instant, d, America::New_York) - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_minute_of_day_keeps_seconds() {
        let d = day(2025, 1, 15);
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 30).unwrap();
        assert!((minute_of_day(instant, d, UTC) - 540.5).abs() < 1e-9);
    }

    #[test]
    fn test_days_touched() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(days_touched(start, end, UTC), vec![day(2025, 1, 1)]);

        let end = Utc.with_ymd_and_hms(2025, 1, 3, 1, 0, 0).unwrap();
        assert_eq!(
            days_touched(start, end, UTC),
            vec![day(2025, 1, 1), day(2025, 1, 2), day(2025, 1, 3)]
        );
    }
}
