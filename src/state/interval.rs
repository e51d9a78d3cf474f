//! Conversion between plain second counts and calendar intervals.
//!
//! Durations travel through the crate as integer seconds. The calendar form is only built for
//! leaderboard responses; configuration durations stay in milliseconds.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Duration, Month, OffsetDateTime};
use utoipa::ToSchema;

/// Calendar-relative duration, broken down into its components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Interval {
    /// True when the interval points to the past.
    pub invert: bool,
    /// Whole years.
    pub years: i64,
    /// Whole months, below 12 when produced by [`seconds_to_interval`].
    pub months: i64,
    /// Whole days left after the months.
    pub days: i64,
    /// Hours, below 24.
    pub hours: i64,
    /// Minutes, below 60.
    pub minutes: i64,
    /// Seconds, below 60.
    pub seconds: i64,
}

/// Raised when an interval cannot be applied to the reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interval does not fit in the supported calendar range")]
pub struct IntervalOutOfRange;

/// Express `seconds` as the calendar interval between now and now + `seconds`.
pub fn seconds_to_interval(seconds: u32) -> Interval {
    seconds_to_interval_at(OffsetDateTime::now_utc(), seconds)
}

/// Same as [`seconds_to_interval`] with an explicit reference instant.
pub fn seconds_to_interval_at(anchor: OffsetDateTime, seconds: u32) -> Interval {
    let target = anchor.saturating_add(Duration::seconds(i64::from(seconds)));
    calendar_diff(anchor, target)
}

/// Apply `interval` to now and return the number of seconds it moved the clock by.
pub fn interval_to_seconds(interval: &Interval) -> Result<i64, IntervalOutOfRange> {
    interval_to_seconds_at(OffsetDateTime::now_utc(), interval)
}

/// Same as [`interval_to_seconds`] with an explicit reference instant.
pub fn interval_to_seconds_at(
    anchor: OffsetDateTime,
    interval: &Interval,
) -> Result<i64, IntervalOutOfRange> {
    let months = interval
        .years
        .checked_mul(12)
        .and_then(|months| months.checked_add(interval.months))
        .ok_or(IntervalOutOfRange)?;
    let rest = [
        (interval.days, 86_400),
        (interval.hours, 3_600),
        (interval.minutes, 60),
        (interval.seconds, 1),
    ]
    .into_iter()
    .try_fold(0_i64, |total, (value, unit)| {
        value
            .checked_mul(unit)
            .and_then(|seconds| total.checked_add(seconds))
    })
    .map(Duration::seconds)
    .ok_or(IntervalOutOfRange)?;

    let target = if interval.invert {
        add_months(anchor, -months).and_then(|pivot| pivot.checked_sub(rest))
    } else {
        add_months(anchor, months).and_then(|pivot| pivot.checked_add(rest))
    }
    .ok_or(IntervalOutOfRange)?;

    Ok(target.unix_timestamp() - anchor.unix_timestamp())
}

/// Break `to - from` into whole months first, then days and time of day.
///
/// Months are counted with [`add_months`], the same operation used to apply an interval, so
/// applying the result to `from` lands back on `to`.
fn calendar_diff(from: OffsetDateTime, to: OffsetDateTime) -> Interval {
    let (start, end, invert) = if to < from {
        (to, from, true)
    } else {
        (from, to, false)
    };

    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(u8::from(end.month()))
        - i64::from(u8::from(start.month()));
    let mut pivot = add_months(start, months).unwrap_or(start);
    while months > 0 && pivot > end {
        months -= 1;
        pivot = add_months(start, months).unwrap_or(start);
    }
    if months < 0 {
        months = 0;
        pivot = start;
    }

    let rest = end - pivot;
    Interval {
        invert,
        years: months / 12,
        months: months % 12,
        days: rest.whole_days(),
        hours: rest.whole_hours() % 24,
        minutes: rest.whole_minutes() % 60,
        seconds: rest.whole_seconds() % 60,
    }
}

/// Move `at` by whole calendar months, clamping the day to the length of the target month.
fn add_months(at: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
    let index = i64::from(at.year()) * 12 + i64::from(u8::from(at.month())) - 1 + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = at.day().min(days_in_month(year, month));
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(at.replace_date(date))
}

fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February if is_leap_year(year) => 29,
        Month::February => 28,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
