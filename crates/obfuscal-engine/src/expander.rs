//! Occurrence expansion -- turns one (possibly recurring) event into the
//! concrete occurrences that fall into the obfuscation window.
//!
//! Recurrence rules are evaluated by the `rrule` crate (v0.13); this module owns
//! the windowing around it and the normalization into the target timezone.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use tracing::warn;

use crate::error::{ObfuscalError, Result};
use crate::event::Event;
use crate::slice::DateTimeSlice;
use crate::timezone::{self, Temporal};

/// Upper bound on instances produced for a single event.
pub const MAX_OCCURRENCES: u16 = 5000;

/// Slack added on both sides of the window when bounding rrule expansion.
///
/// Floating and date values are expanded on a UTC wall clock, which can be up
/// to 14 hours away from the target timezone.
const WINDOW_MARGIN_HOURS: i64 = 24;

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// One occurrence in the event's own temporal shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub start: Temporal,
    pub end: Temporal,
}

impl Occurrence {
    /// Both ends as local date-times in `tz`; dates map to start of day.
    pub fn to_local(&self, tz: &Tz) -> DateTimeSlice {
        DateTimeSlice::new(
            timezone::to_local(&self.start, tz, timezone::start_of_day),
            timezone::to_local(&self.end, tz, timezone::start_of_day),
        )
    }
}

/// Expand `event` into local occurrences within `window`, sorted by start.
///
/// A non-recurring event yields exactly its own start/end. Recurring events may
/// yield occurrences slightly outside the window; callers filter by overlap.
///
/// # Errors
/// Returns `ObfuscalError::Recurrence` if an RRULE cannot be parsed or is
/// inconsistent with the event's DTSTART.
pub fn expand_occurrences(event: &Event, window: &DateTimeSlice, tz: &Tz) -> Result<Vec<DateTimeSlice>> {
    let mut slices: Vec<DateTimeSlice> = raw_occurrences(event, window, tz)?
        .iter()
        .map(|o| o.to_local(tz))
        .collect();
    slices.sort_by_key(|s| (s.start, s.end));
    Ok(slices)
}

/// Like [`expand_occurrences`] but keeps each occurrence in the event's shape.
pub fn raw_occurrences(event: &Event, window: &DateTimeSlice, tz: &Tz) -> Result<Vec<Occurrence>> {
    if !event.is_recurring() {
        return Ok(vec![Occurrence {
            start: event.start,
            end: event.end,
        }]);
    }

    let duration = event.duration();
    let set = recurrence_set(event)?;

    // Occurrences starting before the window can still reach into it.
    let margin = Duration::hours(WINDOW_MARGIN_HOURS);
    let lead = duration
        .max(Duration::zero())
        .checked_add(&margin)
        .unwrap_or(Duration::MAX);
    let after = timezone::local_to_utc(window.start, tz)
        .checked_sub_signed(lead)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let before = timezone::local_to_utc(window.end, tz)
        .checked_add_signed(margin)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let result = set
        .after(after.with_timezone(&rrule::Tz::UTC))
        .before(before.with_timezone(&rrule::Tz::UTC))
        .all(MAX_OCCURRENCES);

    if result.limited {
        warn!(
            limit = MAX_OCCURRENCES,
            "recurrence expansion truncated at occurrence limit"
        );
    }

    result
        .dates
        .into_iter()
        .map(|dt| {
            let start = from_rrule_datetime(dt, &event.start);
            Ok(Occurrence {
                start,
                end: start.shifted(duration)?,
            })
        })
        .collect()
}

/// Build the rrule set from iCalendar text, e.g.
///
/// ```text
/// DTSTART;TZID=Europe/Berlin:20240304T090000
/// RRULE:FREQ=WEEKLY;BYDAY=MO;UNTIL=20240401T080000Z
/// EXDATE;TZID=Europe/Berlin:20240311T090000
/// ```
fn recurrence_set(event: &Event) -> Result<RRuleSet> {
    let frame = frame_of(&event.start);

    let mut lines = vec![ical_line("DTSTART", &[event.start], &frame)];
    for raw in &event.rrules {
        lines.push(format!("RRULE:{}", normalize_until(raw, &frame)?));
    }
    if !event.rdates.is_empty() {
        lines.push(ical_line("RDATE", &event.rdates, &frame));
    }
    if !event.exdates.is_empty() {
        lines.push(ical_line("EXDATE", &event.exdates, &frame));
    }

    let text = lines.join("\n");
    text.parse::<RRuleSet>()
        .map_err(|e| ObfuscalError::Recurrence(format!("{}: {}", event.rrules.join(" / "), e)))
}

/// The timezone an event is expanded in.
///
/// Zoned events expand in their own zone so wall-clock times survive DST.
/// Everything else expands on a UTC wall clock.
fn frame_of(start: &Temporal) -> Tz {
    match start {
        Temporal::Zoned(dt) => dt.timezone(),
        Temporal::Date(_) | Temporal::Floating(_) | Temporal::Offset(_) => chrono_tz::UTC,
    }
}

/// One content line carrying `values` as wall-clock times in `frame`.
fn ical_line(name: &str, values: &[Temporal], frame: &Tz) -> String {
    let utc = *frame == chrono_tz::UTC;
    let values: Vec<String> = values
        .iter()
        .map(|v| {
            let local = timezone::to_local(v, frame, timezone::start_of_day);
            local.format(if utc { UTC_FORMAT } else { LOCAL_FORMAT }).to_string()
        })
        .collect();

    if utc {
        format!("{}:{}", name, values.join(","))
    } else {
        format!("{};TZID={}:{}", name, frame.name(), values.join(","))
    }
}

/// Map an expanded instant back into the shape of the event's DTSTART.
fn from_rrule_datetime(dt: DateTime<rrule::Tz>, shape: &Temporal) -> Temporal {
    match shape {
        Temporal::Date(_) => Temporal::Date(dt.naive_utc().date()),
        Temporal::Floating(_) => Temporal::Floating(dt.naive_utc()),
        Temporal::Offset(orig) => Temporal::Offset(dt.with_timezone(&orig.timezone())),
        Temporal::Zoned(orig) => Temporal::Zoned(dt.with_timezone(&orig.timezone())),
    }
}

/// Rewrite a floating or date `UNTIL` as a UTC value in the expansion frame.
///
/// The rrule crate rejects rules whose UNTIL does not agree with DTSTART's
/// timezone; RFC 5545 allows both forms in the wild.
fn normalize_until(rule: &str, frame: &Tz) -> Result<String> {
    let rule = rule.trim().trim_start_matches("RRULE:");
    let parts: Vec<String> = rule
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                until_as_utc(value, frame).map(|v| format!("UNTIL={}", v))
            }
            _ => Ok(part.to_string()),
        })
        .collect::<Result<_>>()?;
    Ok(parts.join(";"))
}

fn until_as_utc(value: &str, frame: &Tz) -> Result<String> {
    if value.ends_with('Z') {
        return Ok(value.to_string());
    }
    let local = if value.len() == 8 {
        chrono::NaiveDate::parse_from_str(value, "%Y%m%d").map(|d| d.and_hms_opt(23, 59, 59))
    } else {
        NaiveDateTime::parse_from_str(value, LOCAL_FORMAT).map(Some)
    }
    .ok()
    .flatten()
    .ok_or_else(|| ObfuscalError::Recurrence(format!("invalid UNTIL value '{}'", value)))?;

    Ok(timezone::local_to_utc(local, frame).format(UTC_FORMAT).to_string())
}
