//! The obfuscation engine.
//!
//! Every input event lands in one of four classes:
//!
//! 1. **Hidden** -- description starts with `HIDE`; dropped.
//! 2. **Shown** -- description starts with `SHOW`; every occurrence in the
//!    timeframe is reproduced with its summary and a fresh UID.
//! 3. **Multi-day** -- starts on a plain date and is not shown; dropped, since a
//!    whole day cannot be placed into sub-day sections.
//! 4. **Obfuscated** -- everything else; marks each section-in-period that one
//!    of its occurrences touches as busy.
//!
//! Busy sections are then merged into blocks per day.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ObfuscationConfig;
use crate::error::Result;
use crate::event::{Event, InputCalendar, Tag};
use crate::expander;
use crate::slice::{self, DateTimeSlice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Hidden,
    Shown,
    MultiDay,
    Obfuscated,
}

pub fn classify(event: &Event) -> Classification {
    match event.tag() {
        Some(Tag::Hide) => Classification::Hidden,
        Some(Tag::Show) => Classification::Shown,
        None if event.is_multi_day() => Classification::MultiDay,
        None => Classification::Obfuscated,
    }
}

/// Start or end of a shown event. Multi-day events keep date granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ShownTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// One occurrence of a `SHOW` event, re-identified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShownEvent {
    pub uid: Uuid,
    pub summary: String,
    pub start: ShownTime,
    pub end: ShownTime,
}

impl ShownEvent {
    /// Equality ignoring the generated UID.
    pub fn same_content(&self, other: &ShownEvent) -> bool {
        self.summary == other.summary && self.start == other.start && self.end == other.end
    }
}

/// Result of one engine run; handed to [`crate::output`] and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResult {
    pub shown: Vec<ShownEvent>,
    /// Merged busy blocks, sorted by start.
    pub busy: Vec<DateTimeSlice>,
}

/// Stateless obfuscation over a validated [`ObfuscationConfig`].
#[derive(Debug, Clone)]
pub struct Obfuscator {
    config: ObfuscationConfig,
}

impl Obfuscator {
    pub fn new(config: ObfuscationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ObfuscationConfig {
        &self.config
    }

    /// Run the engine over all events of `calendars`.
    ///
    /// # Errors
    /// Fails as a whole if any event's recurrence cannot be expanded; no
    /// partial result is returned.
    pub fn obfuscate(&self, calendars: &[InputCalendar]) -> Result<EngineResult> {
        let window = self.config.timeframe.to_date_time_slice();
        let sections = sections_in_period(&self.config);

        let mut shown = Vec::new();
        let mut occurrence_sets: Vec<Vec<DateTimeSlice>> = Vec::new();
        let mut hidden = 0usize;
        let mut multi_day = 0usize;
        let mut outside = 0usize;

        for event in calendars.iter().flat_map(|c| c.events.iter()) {
            match classify(event) {
                Classification::Hidden => hidden += 1,
                Classification::MultiDay => multi_day += 1,
                Classification::Shown => shown.extend(self.show(event, &window)?),
                Classification::Obfuscated => {
                    let occurrences =
                        expander::expand_occurrences(event, &window, &self.config.timezone)?;
                    if occurrences.iter().any(|o| window.intersects_or_contains(o)) {
                        occurrence_sets.push(occurrences);
                    } else {
                        outside += 1;
                    }
                }
            }
        }

        let busy_sections = mark_busy(&sections, &occurrence_sets);
        let busy = slice::merge_same_day(busy_sections);

        debug!(
            hidden,
            multi_day,
            outside_timeframe = outside,
            obfuscated = occurrence_sets.len(),
            "classified events"
        );
        info!(
            sections = sections.len(),
            busy_blocks = busy.len(),
            shown = shown.len(),
            "obfuscation complete"
        );

        Ok(EngineResult { shown, busy })
    }

    fn show(&self, event: &Event, window: &DateTimeSlice) -> Result<Vec<ShownEvent>> {
        let tz = &self.config.timezone;
        let summary = event.summary.clone().unwrap_or_default();
        let multi_day = event.is_multi_day();

        Ok(expander::raw_occurrences(event, window, tz)?
            .iter()
            .map(|o| o.to_local(tz))
            .filter(|local| window.intersects_or_contains(local))
            .map(|local| {
                let (start, end) = if multi_day {
                    (ShownTime::Date(local.start.date()), ShownTime::Date(local.end.date()))
                } else {
                    (ShownTime::DateTime(local.start), ShownTime::DateTime(local.end))
                };
                ShownEvent {
                    uid: Uuid::new_v4(),
                    summary: summary.clone(),
                    start,
                    end,
                }
            })
            .collect())
    }
}

/// Every configured section anchored to every date of the timeframe.
pub fn sections_in_period(config: &ObfuscationConfig) -> Vec<DateTimeSlice> {
    config
        .timeframe
        .dates()
        .flat_map(|day| config.sections.iter().map(move |s| s.at_date(day)))
        .collect()
}

/// Fold occurrences into the set of busy sections.
///
/// Marking is monotonic: a section already busy is never tested again, so the
/// order of `occurrence_sets` does not change the result.
fn mark_busy(sections: &[DateTimeSlice], occurrence_sets: &[Vec<DateTimeSlice>]) -> BTreeSet<DateTimeSlice> {
    occurrence_sets
        .iter()
        .fold(BTreeSet::new(), |mut busy, occurrences| {
            for section in sections {
                if !busy.contains(section)
                    && occurrences.iter().any(|o| section.intersects_or_contains(o))
                {
                    busy.insert(*section);
                }
            }
            busy
        })
}
