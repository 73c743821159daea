//! Timezone normalization -- brings every event time into the target timezone.
//!
//! Calendar properties carry one of four temporal shapes. [`Temporal`] models
//! them as an enum so [`to_local`] is checked for exhaustiveness at compile time.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use chrono_tz::Tz;

use crate::error::{ObfuscalError, Result};

/// A temporal value as it appears on a calendar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// `VALUE=DATE`, the marker for all-day and multi-day events.
    Date(NaiveDate),
    /// A date-time without zone information, interpreted as already local.
    Floating(NaiveDateTime),
    /// A date-time with a fixed UTC offset. UTC (`...Z`) values use `+00:00`.
    Offset(DateTime<FixedOffset>),
    /// A date-time bound to an IANA timezone via `TZID`.
    Zoned(DateTime<Tz>),
}

impl Temporal {
    pub fn is_date(&self) -> bool {
        matches!(self, Temporal::Date(_))
    }

    /// The calendar date in the value's own frame.
    pub fn date_naive(&self) -> NaiveDate {
        match self {
            Temporal::Date(d) => *d,
            Temporal::Floating(dt) => dt.date(),
            Temporal::Offset(dt) => dt.date_naive(),
            Temporal::Zoned(dt) => dt.date_naive(),
        }
    }

    /// Shift the value by `delta` while keeping its shape.
    ///
    /// Zoned values are shifted in wall-clock time, so a one-hour meeting at
    /// 09:00 stays at 09:00 on both sides of a DST transition.
    ///
    /// # Errors
    /// Returns `ObfuscalError::Parse` if the result is outside the representable
    /// date range.
    pub fn shifted(&self, delta: Duration) -> Result<Temporal> {
        let shifted = match self {
            Temporal::Date(d) => d.checked_add_signed(delta).map(Temporal::Date),
            Temporal::Floating(dt) => dt.checked_add_signed(delta).map(Temporal::Floating),
            Temporal::Offset(dt) => dt.checked_add_signed(delta).map(Temporal::Offset),
            Temporal::Zoned(dt) => {
                let tz = dt.timezone();
                dt.naive_local()
                    .checked_add_signed(delta)
                    .map(|local| Temporal::Zoned(resolve_local(local, &tz)))
            }
        };
        shifted.ok_or_else(|| {
            ObfuscalError::Parse(format!("shifting {:?} by {} leaves the supported range", self, delta))
        })
    }

    /// Signed distance from `self` to `later`, measured in `self`'s frame.
    ///
    /// Mixed shapes fall back to comparing local date-times at start of day.
    pub fn until(&self, later: &Temporal) -> Duration {
        match (self, later) {
            (Temporal::Date(a), Temporal::Date(b)) => *b - *a,
            (Temporal::Offset(a), Temporal::Offset(b)) => *b - *a,
            (Temporal::Zoned(a), Temporal::Zoned(b)) => b.naive_local() - a.naive_local(),
            (Temporal::Offset(a), Temporal::Zoned(b)) => b.with_timezone(&Utc) - a.with_timezone(&Utc),
            (Temporal::Zoned(a), Temporal::Offset(b)) => b.with_timezone(&Utc) - a.with_timezone(&Utc),
            (a, b) => naive_of(b) - naive_of(a),
        }
    }
}

fn naive_of(value: &Temporal) -> NaiveDateTime {
    match value {
        Temporal::Date(d) => start_of_day(*d),
        Temporal::Floating(dt) => *dt,
        Temporal::Offset(dt) => dt.naive_local(),
        Temporal::Zoned(dt) => dt.naive_local(),
    }
}

/// Convert `value` to a local date-time in `tz`.
///
/// - `Date` goes through `date_fallback` (normally [`start_of_day`]).
/// - `Floating` passes through unchanged.
/// - `Offset` and `Zoned` become the same instant viewed in `tz`.
pub fn to_local<F>(value: &Temporal, tz: &Tz, date_fallback: F) -> NaiveDateTime
where
    F: Fn(NaiveDate) -> NaiveDateTime,
{
    match value {
        Temporal::Date(d) => date_fallback(*d),
        Temporal::Floating(dt) => *dt,
        Temporal::Offset(dt) => dt.with_timezone(tz).naive_local(),
        Temporal::Zoned(dt) => dt.with_timezone(tz).naive_local(),
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Parse an IANA timezone identifier such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ObfuscalError::InvalidTimezone(name.to_string()))
}

/// Map a local date-time in `tz` to its UTC instant.
pub fn local_to_utc(local: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    resolve_local(local, tz).with_timezone(&Utc)
}

/// Resolve a wall-clock time in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier mapping. Times inside a
/// DST gap are shifted forward by an hour, past the gap.
pub(crate) fn resolve_local(local: NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => match local
            .checked_add_signed(Duration::hours(1))
            .map(|later| tz.from_local_datetime(&later))
        {
            Some(LocalResult::Single(dt)) | Some(LocalResult::Ambiguous(dt, _)) => dt,
            _ => tz.from_utc_datetime(&local),
        },
    }
}
