//! Calendar events as the engine sees them, and the adapter that reads them from
//! iCalendar input via the `ical` crate.

use std::collections::HashMap;
use std::io::BufRead;

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ical::parser::ical::component::{IcalCalendar, IcalEvent};
use ical::property::Property;
use ical::IcalParser;
use tracing::{debug, warn};

use crate::error::{ObfuscalError, Result};
use crate::timezone::{self, Temporal};

const HIDE_TAG: &str = "HIDE";
const SHOW_TAG: &str = "SHOW";

/// Classification tag read from the start of an event's description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Hide,
    Show,
}

/// A read-only calendar event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub uid: Option<String>,
    pub start: Temporal,
    pub end: Temporal,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Raw `RRULE` values, e.g. `FREQ=WEEKLY;BYDAY=MO`.
    pub rrules: Vec<String>,
    pub rdates: Vec<Temporal>,
    pub exdates: Vec<Temporal>,
    /// Set on instances that override one occurrence of a recurring event.
    pub recurrence_id: Option<Temporal>,
}

impl Event {
    pub fn new(start: Temporal, end: Temporal) -> Self {
        Self {
            uid: None,
            start,
            end,
            summary: None,
            description: None,
            rrules: Vec::new(),
            rdates: Vec::new(),
            exdates: Vec::new(),
            recurrence_id: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrules.push(rrule.into());
        self
    }

    pub fn with_exdate(mut self, exdate: Temporal) -> Self {
        self.exdates.push(exdate);
        self
    }

    /// `HIDE` / `SHOW` prefix of the description. Case-sensitive.
    pub fn tag(&self) -> Option<Tag> {
        let description = self.description.as_deref()?;
        if description.starts_with(HIDE_TAG) {
            Some(Tag::Hide)
        } else if description.starts_with(SHOW_TAG) {
            Some(Tag::Show)
        } else {
            None
        }
    }

    /// All-day and multi-day events start on a plain date.
    pub fn is_multi_day(&self) -> bool {
        self.start.is_date()
    }

    pub fn is_recurring(&self) -> bool {
        !self.rrules.is_empty() || !self.rdates.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.start.until(&self.end)
    }
}

/// The events of one parsed `VCALENDAR`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputCalendar {
    pub events: Vec<Event>,
}

impl InputCalendar {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub(crate) fn from_ical(calendar: &IcalCalendar) -> Result<Self> {
        let mut events = Vec::with_capacity(calendar.events.len());
        for raw in &calendar.events {
            match event_from_ical(raw)? {
                Some(event) => events.push(event),
                None => warn!("skipping VEVENT without DTSTART"),
            }
        }
        attach_overrides(&mut events);

        debug!(events = events.len(), "parsed calendar");
        Ok(Self::new(events))
    }
}

/// Read every `VCALENDAR` in `reader`.
///
/// Events without `DTSTART` are skipped. Overridden instances
/// (`RECURRENCE-ID`) are kept as standalone events and excluded from their
/// master's recurrence set.
pub fn parse_calendars<R: BufRead>(reader: R) -> Result<Vec<InputCalendar>> {
    let mut calendars = Vec::new();

    for calendar in IcalParser::new(reader) {
        let calendar = calendar.map_err(|e| ObfuscalError::Parse(e.to_string()))?;
        calendars.push(InputCalendar::from_ical(&calendar)?);
    }

    Ok(calendars)
}

fn attach_overrides(events: &mut [Event]) {
    let mut overridden: HashMap<String, Vec<Temporal>> = HashMap::new();
    for event in events.iter() {
        if let (Some(uid), Some(rid)) = (&event.uid, event.recurrence_id) {
            overridden.entry(uid.clone()).or_default().push(rid);
        }
    }
    if overridden.is_empty() {
        return;
    }

    for event in events.iter_mut().filter(|e| e.recurrence_id.is_none()) {
        if let Some(rids) = event.uid.as_ref().and_then(|uid| overridden.get(uid)) {
            debug!(overrides = rids.len(), "excluding overridden instances from master");
            event.exdates.extend(rids.iter().copied());
        }
    }
}

fn event_from_ical(raw: &IcalEvent) -> Result<Option<Event>> {
    let Some(dtstart) = find(&raw.properties, "DTSTART") else {
        return Ok(None);
    };
    let start = property_temporal(dtstart)?;

    let end = match (find(&raw.properties, "DTEND"), find(&raw.properties, "DURATION")) {
        (Some(dtend), _) => property_temporal(dtend)?,
        (None, Some(duration)) => start.shifted(parse_duration(value_of(duration))?)?,
        (None, None) if start.is_date() => start.shifted(Duration::days(1))?,
        (None, None) => start,
    };

    let mut event = Event::new(start, end);
    event.uid = find(&raw.properties, "UID").and_then(|p| p.value.clone());
    event.summary = find(&raw.properties, "SUMMARY").and_then(|p| p.value.clone());
    event.description = find(&raw.properties, "DESCRIPTION").and_then(|p| p.value.clone());
    if let Some(rid) = find(&raw.properties, "RECURRENCE-ID") {
        event.recurrence_id = Some(property_temporal(rid)?);
    }

    for prop in &raw.properties {
        match prop.name.to_ascii_uppercase().as_str() {
            "RRULE" => event.rrules.push(value_of(prop).to_string()),
            "RDATE" => event.rdates.extend(property_temporals(prop)?),
            "EXDATE" => event.exdates.extend(property_temporals(prop)?),
            _ => {}
        }
    }

    Ok(Some(event))
}

pub(crate) fn find<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

fn value_of(prop: &Property) -> &str {
    prop.value.as_deref().unwrap_or("").trim()
}

fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

pub(crate) fn property_temporal(prop: &Property) -> Result<Temporal> {
    parse_temporal(value_of(prop), param(prop, "TZID"), param(prop, "VALUE"))
        .map_err(|e| with_property_context(e, prop))
}

/// Multi-valued properties such as `EXDATE:20240304T090000,20240311T090000`.
/// `PERIOD` values contribute their start.
fn property_temporals(prop: &Property) -> Result<Vec<Temporal>> {
    let tzid = param(prop, "TZID");
    let value_type = param(prop, "VALUE");
    value_of(prop)
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            let v = v.split('/').next().unwrap_or(v);
            parse_temporal(v, tzid, value_type).map_err(|e| with_property_context(e, prop))
        })
        .collect()
}

fn with_property_context(err: ObfuscalError, prop: &Property) -> ObfuscalError {
    match err {
        ObfuscalError::Parse(msg) => ObfuscalError::Parse(format!("{}: {}", prop.name, msg)),
        other => other,
    }
}

/// Parse an iCalendar DATE or DATE-TIME value.
///
/// `20240304` (or `VALUE=DATE`) is a date, `20240304T093000Z` is UTC, a `TZID`
/// binds the value to that zone, and anything else is floating.
pub fn parse_temporal(raw: &str, tzid: Option<&str>, value_type: Option<&str>) -> Result<Temporal> {
    let is_date = value_type.is_some_and(|v| v.eq_ignore_ascii_case("DATE")) || raw.len() == 8;
    if is_date {
        return NaiveDate::parse_from_str(raw, "%Y%m%d")
            .map(Temporal::Date)
            .map_err(|_| ObfuscalError::Parse(format!("invalid date '{}'", raw)));
    }

    if let Some(utc) = raw.strip_suffix('Z') {
        let naive = parse_naive(utc)?;
        return Ok(Temporal::Offset(Utc.from_utc_datetime(&naive).fixed_offset()));
    }

    let naive = parse_naive(raw)?;
    match tzid {
        Some(name) => {
            let tz = timezone::parse_timezone(name.trim_matches('"').trim_start_matches('/'))?;
            Ok(Temporal::Zoned(timezone::resolve_local(naive, &tz)))
        }
        None => Ok(Temporal::Floating(naive)),
    }
}

fn parse_naive(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S")
        .map_err(|_| ObfuscalError::Parse(format!("invalid date-time '{}'", raw)))
}

/// Parse an RFC 5545 DURATION value such as `PT1H30M`, `P1D` or `-P1W`.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let invalid = || ObfuscalError::Parse(format!("invalid duration '{}'", raw));
    let out_of_range = || ObfuscalError::Parse(format!("duration '{}' is out of range", raw));

    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;

    let mut total = Duration::zero();
    let mut digits = String::new();
    let mut in_time = false;
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'T' if !in_time && digits.is_empty() => in_time = true,
            unit => {
                let n: i64 = digits.parse().map_err(|_| invalid())?;
                digits.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => return Err(invalid()),
                };
                total = part
                    .and_then(|part| total.checked_add(&part))
                    .ok_or_else(out_of_range)?;
            }
        }
    }
    if !digits.is_empty() {
        return Err(invalid());
    }

    Ok(if negative { -total } else { total })
}
