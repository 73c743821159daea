//! JSON summary of a generated calendar, for viewers that do not speak iCalendar.
//!
//! Generated calendars contain only concrete occurrences, so events are listed
//! as-is without recurrence expansion.

use std::io::BufRead;

use ical::IcalParser;
use serde::{Deserialize, Serialize};

use crate::error::{ObfuscalError, Result};
use crate::event::{find, property_temporal, InputCalendar};
use crate::timezone::Temporal;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub events: Vec<SummaryEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub busy: Vec<SummaryBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEvent {
    pub start: String,
    pub end: String,
    pub summary: String,
    pub is_multi_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub start: String,
    pub end: String,
}

/// Summarize the events of an already parsed calendar.
pub fn summarize(calendar: &InputCalendar) -> CalendarSummary {
    let events = calendar
        .events
        .iter()
        .map(|event| SummaryEvent {
            start: iso(&event.start),
            end: iso(&event.end),
            summary: event.summary.as_deref().map(unescape_text).unwrap_or_default(),
            is_multi_day: event.is_multi_day(),
        })
        .collect();

    CalendarSummary {
        events,
        busy: Vec::new(),
    }
}

/// Summarize every `VCALENDAR` in `reader`, including its free/busy blocks.
pub fn summarize_ics<R: BufRead>(reader: R) -> Result<CalendarSummary> {
    let mut summary = CalendarSummary::default();

    for calendar in IcalParser::new(reader) {
        let calendar = calendar.map_err(|e| ObfuscalError::Parse(e.to_string()))?;
        summary
            .events
            .extend(summarize(&InputCalendar::from_ical(&calendar)?).events);

        for free_busy in &calendar.free_busys {
            let start = find(&free_busy.properties, "DTSTART").map(property_temporal);
            let end = find(&free_busy.properties, "DTEND").map(property_temporal);
            if let (Some(start), Some(end)) = (start, end) {
                summary.busy.push(SummaryBlock {
                    start: iso(&start?),
                    end: iso(&end?),
                });
            }
        }
    }

    Ok(summary)
}

fn iso(value: &Temporal) -> String {
    match value {
        Temporal::Date(d) => d.format("%Y-%m-%d").to_string(),
        Temporal::Floating(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Temporal::Offset(dt) => dt.to_rfc3339(),
        Temporal::Zoned(dt) => dt.to_rfc3339(),
    }
}

/// Undo RFC 5545 TEXT escaping (`\,` `\;` `\n` `\\`).
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
