//! # obfuscal-engine
//!
//! Privacy-preserving calendar obfuscation.
//!
//! Takes one or more calendars and produces a single sanitized calendar that
//! reveals only *when* its owner is busy. Busy time is reported on a grid of
//! configured daily sections (e.g. `08:00-12:00`, `13:00-18:00`) within a bounded
//! timeframe, so a third party learns which sections are taken and nothing else.
//!
//! Descriptions steer the process: events starting with `HIDE` are dropped,
//! events starting with `SHOW` are copied through with only their summary.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use obfuscal_engine::{obfuscate_to_ics, DateRange, ObfuscationConfig};
//!
//! let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\n\
//!            DTSTART:20240304T093000Z\r\nDTEND:20240304T101500Z\r\n\
//!            SUMMARY:Doctor\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
//!
//! let config = ObfuscationConfig::new(
//!     chrono_tz::UTC,
//!     DateRange::new(
//!         NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
//!     )
//!     .unwrap(),
//!     vec!["08:00-12:00".parse().unwrap(), "13:00-18:00".parse().unwrap()],
//! )
//! .unwrap();
//!
//! let out = obfuscate_to_ics(ics.as_bytes(), &config).unwrap();
//! assert!(out.contains("FREEBUSY;FBTYPE=FREE:20240304T080000Z/20240304T120000Z"));
//! assert!(!out.contains("Doctor"));
//! ```
//!
//! ## Modules
//!
//! - [`slice`] -- Date ranges, daily sections, date-time intervals and merging
//! - [`timezone`] -- Normalizes the four calendar time shapes into one timezone
//! - [`event`] -- Event model and iCalendar input adapter
//! - [`expander`] -- Occurrences of a (recurring) event within a window
//! - [`obfuscator`] -- Classification and busy-section computation
//! - [`output`] -- Assembles and renders the sanitized calendar
//! - [`summary`] -- JSON summary of a generated calendar
//! - [`config`] -- Obfuscation configuration
//! - [`error`] -- Error types

pub mod config;
pub mod error;
pub mod event;
pub mod expander;
pub mod obfuscator;
pub mod output;
pub mod slice;
pub mod summary;
pub mod timezone;

pub use config::{FreeBusyType, ObfuscationConfig};
pub use error::ObfuscalError;
pub use event::{parse_calendars, Event, InputCalendar, Tag};
pub use expander::{expand_occurrences, Occurrence};
pub use obfuscator::{EngineResult, Obfuscator, ShownEvent, ShownTime};
pub use output::{assemble, obfuscate_to_ics, render};
pub use slice::{merge_same_day, DateRange, DateTimeSlice, TimeOfDaySlice};
pub use summary::{summarize_ics, CalendarSummary};
pub use timezone::Temporal;
