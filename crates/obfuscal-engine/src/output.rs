//! Output assembly -- maps an [`EngineResult`] onto iCalendar components.
//!
//! Wire syntax is left to the `ical` generator; this module only decides which
//! properties each component carries.

use std::io::BufRead;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use ical::generator::Emitter;
use ical::parser::ical::component::{IcalCalendar, IcalEvent, IcalFreeBusy};
use ical::property::Property;
use uuid::Uuid;

use crate::config::ObfuscationConfig;
use crate::error::Result;
use crate::event::parse_calendars;
use crate::obfuscator::{EngineResult, Obfuscator, ShownEvent, ShownTime};
use crate::slice::DateTimeSlice;
use crate::timezone;

pub const PRODUCT_ID: &str = concat!("-//Obfuscal//Obfuscal Engine ", env!("CARGO_PKG_VERSION"), "//EN");

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

/// Build the sanitized calendar. `stamp` becomes every component's `DTSTAMP`.
///
/// Shown events carry only `UID`, `DTSTAMP`, `DTSTART`, `DTEND` and `SUMMARY`.
/// Local times are converted from the configured timezone to UTC.
pub fn assemble(result: &EngineResult, config: &ObfuscationConfig, stamp: DateTime<Utc>) -> IcalCalendar {
    let mut calendar = IcalCalendar::new();
    calendar.properties = vec![
        property("PRODID", PRODUCT_ID),
        property("VERSION", "2.0"),
        property("CALSCALE", "GREGORIAN"),
    ];

    let dtstamp = stamp.format(UTC_FORMAT).to_string();
    let tz = &config.timezone;

    calendar.events = result
        .shown
        .iter()
        .map(|shown| shown_event(shown, tz, &dtstamp))
        .collect();
    calendar.free_busys = result
        .busy
        .iter()
        .map(|block| busy_block(block, config, &dtstamp))
        .collect();

    calendar
}

/// Render a calendar to iCalendar text.
pub fn render(calendar: &IcalCalendar) -> String {
    calendar.generate()
}

/// Parse `reader`, obfuscate every calendar in it and render the result.
pub fn obfuscate_to_ics<R: BufRead>(reader: R, config: &ObfuscationConfig) -> Result<String> {
    let obfuscator = Obfuscator::new(config.clone())?;
    let result = obfuscator.obfuscate(&parse_calendars(reader)?)?;
    Ok(render(&assemble(&result, obfuscator.config(), Utc::now())))
}

fn shown_event(shown: &ShownEvent, tz: &Tz, dtstamp: &str) -> IcalEvent {
    let mut event = IcalEvent::new();
    event.properties = vec![
        property("UID", &shown.uid.to_string()),
        property("DTSTAMP", dtstamp),
        time_property("DTSTART", &shown.start, tz),
        time_property("DTEND", &shown.end, tz),
        property("SUMMARY", &shown.summary),
    ];
    event
}

fn busy_block(block: &DateTimeSlice, config: &ObfuscationConfig, dtstamp: &str) -> IcalFreeBusy {
    let start = utc(block.start, &config.timezone);
    let end = utc(block.end, &config.timezone);

    let mut free_busy = IcalFreeBusy::new();
    free_busy.properties = vec![
        property("UID", &Uuid::new_v4().to_string()),
        property("DTSTAMP", dtstamp),
        property("DTSTART", &start),
        property("DTEND", &end),
        Property {
            name: "FREEBUSY".to_string(),
            params: Some(vec![(
                "FBTYPE".to_string(),
                vec![config.free_busy_type.as_str().to_string()],
            )]),
            value: Some(format!("{}/{}", start, end)),
        },
    ];
    free_busy
}

fn time_property(name: &str, time: &ShownTime, tz: &Tz) -> Property {
    match time {
        ShownTime::Date(date) => Property {
            name: name.to_string(),
            params: Some(vec![("VALUE".to_string(), vec!["DATE".to_string()])]),
            value: Some(date.format(DATE_FORMAT).to_string()),
        },
        ShownTime::DateTime(local) => property(name, &utc(*local, tz)),
    }
}

fn utc(local: NaiveDateTime, tz: &Tz) -> String {
    timezone::local_to_utc(local, tz).format(UTC_FORMAT).to_string()
}

fn property(name: &str, value: &str) -> Property {
    Property {
        name: name.to_string(),
        params: None,
        value: Some(value.to_string()),
    }
}
