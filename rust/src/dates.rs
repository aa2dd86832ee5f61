//! Day arithmetic on task timestamps.

use chrono::{Duration, NaiveDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Ceiling of `end - start` in days.
///
/// Identical timestamps give 0; a reversed range gives a non-positive value.
pub fn ceil_days_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let seconds = (end - start).num_seconds();
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    if seconds.rem_euclid(SECONDS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Shift a timestamp by a signed number of days, or `None` past the calendar.
pub fn checked_add_days(date: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

/// Shift a timestamp by a signed number of days, clamping at the ends of the
/// representable calendar.
pub fn add_days(date: NaiveDateTime, days: i64) -> NaiveDateTime {
    checked_add_days(date, days).unwrap_or(if days < 0 {
        NaiveDateTime::MIN
    } else {
        NaiveDateTime::MAX
    })
}
