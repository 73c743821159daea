//! Time-slice algebra -- date ranges, time-of-day sections and date-time intervals.
//!
//! All values here are *local* (naive) times. Timezone handling happens before a
//! value becomes a [`DateTimeSlice`]; see [`crate::timezone`].

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ObfuscalError, Result};

/// A configured section of a day, e.g. working hours `08:00-12:00`.
///
/// Deserializes from either `"08:00-12:00"` or `{ start = "08:00", end = "12:00" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TimeOfDaySliceRepr")]
pub struct TimeOfDaySlice {
    #[serde(serialize_with = "hhmm::serialize")]
    pub start: NaiveTime,
    #[serde(serialize_with = "hhmm::serialize")]
    pub end: NaiveTime,
}

impl TimeOfDaySlice {
    /// Create a section. Returns `ObfuscalError::InvalidSlice` if `start > end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start > end {
            return Err(ObfuscalError::InvalidSlice(format!(
                "section start {} is after its end {}",
                start.format(hhmm::FORMAT),
                end.format(hhmm::FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Anchor this section to a calendar date.
    pub fn at_date(&self, date: NaiveDate) -> DateTimeSlice {
        DateTimeSlice::new(date.and_time(self.start), date.and_time(self.end))
    }

    pub fn overlaps(&self, other: &TimeOfDaySlice) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeOfDaySlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(hhmm::FORMAT),
            self.end.format(hhmm::FORMAT)
        )
    }
}

impl FromStr for TimeOfDaySlice {
    type Err = ObfuscalError;

    /// Parse `HH:MM-HH:MM` (seconds are accepted on either side).
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            ObfuscalError::InvalidSlice(format!("expected HH:MM-HH:MM, got '{}'", s))
        })?;
        Self::new(hhmm::parse(start.trim())?, hhmm::parse(end.trim())?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeOfDaySliceRepr {
    Compact(String),
    Fields {
        #[serde(deserialize_with = "hhmm::deserialize")]
        start: NaiveTime,
        #[serde(deserialize_with = "hhmm::deserialize")]
        end: NaiveTime,
    },
}

impl TryFrom<TimeOfDaySliceRepr> for TimeOfDaySlice {
    type Error = ObfuscalError;

    fn try_from(repr: TimeOfDaySliceRepr) -> Result<Self> {
        match repr {
            TimeOfDaySliceRepr::Compact(s) => s.parse(),
            TimeOfDaySliceRepr::Fields { start, end } => Self::new(start, end),
        }
    }
}

/// An inclusive range of calendar dates -- the obfuscation timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DateRangeRepr")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range. Returns `ObfuscalError::InvalidSlice` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ObfuscalError::InvalidSlice(format!(
                "timeframe start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of day boundaries between `start` and `end`.
    ///
    /// Sections are laid out for `start + i` with `i in 0..days()`, so `end`
    /// itself is the first day not considered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days()).map(move |i| self.start + Duration::days(i))
    }

    /// From the start of the first day to the start of the day after `end`,
    /// saturating at `NaiveDateTime::MAX`.
    pub fn to_date_time_slice(&self) -> DateTimeSlice {
        DateTimeSlice::new(
            self.start.and_time(NaiveTime::MIN),
            self.end
                .succ_opt()
                .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN)),
        )
    }
}

#[derive(Deserialize)]
struct DateRangeRepr {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateRangeRepr> for DateRange {
    type Error = ObfuscalError;

    fn try_from(repr: DateRangeRepr) -> Result<Self> {
        Self::new(repr.start, repr.end)
    }
}

/// A local date-time interval; the unit of overlap computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTimeSlice {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateTimeSlice {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// True if `other` touches the start boundary, touches the end boundary, or
    /// lies within `self`.
    ///
    /// The endpoints are deliberately asymmetric: with `self = 10:00-13:00`,
    /// `09:00-10:00` and `13:00-14:00` do not match, but `10:00-14:00` does.
    /// A zero-length `other` strictly inside `self` matches through the
    /// containment clause.
    pub fn intersects_or_contains(&self, other: &DateTimeSlice) -> bool {
        (other.start <= self.start && other.end > self.start)
            || (other.start < self.end && other.end >= self.end)
            || (other.start >= self.start && other.end <= self.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for DateTimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%M"),
            self.end.format("%Y-%m-%dT%H:%M")
        )
    }
}

/// Merge adjacent slices that start on the same calendar date.
///
/// The input is sorted by `(start, end)` first. A slice is folded into its
/// predecessor only when the predecessor ends exactly where it starts and both
/// begin on the same day; every other slice opens a new block.
pub fn merge_same_day<I>(slices: I) -> Vec<DateTimeSlice>
where
    I: IntoIterator<Item = DateTimeSlice>,
{
    let mut sorted: Vec<DateTimeSlice> = slices.into_iter().collect();
    sorted.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<DateTimeSlice> = Vec::with_capacity(sorted.len());
    for slice in sorted {
        if let Some(last) = merged.last_mut() {
            if last.start.date() == slice.start.date() && last.end == slice.start {
                last.end = slice.end;
                continue;
            }
        }
        merged.push(slice);
    }

    merged
}

/// `HH:MM` formatting for section times.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::{ObfuscalError, Result};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, FORMAT))
            .map_err(|_| ObfuscalError::InvalidSlice(format!("invalid time of day '{}'", s)))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

