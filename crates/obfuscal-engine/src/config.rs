//! Obfuscation configuration: target timezone, timeframe and daily sections.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ObfuscalError, Result};
use crate::slice::{DateRange, TimeOfDaySlice};
use crate::timezone;

/// `FBTYPE` parameter stamped on every emitted free/busy block.
///
/// Defaults to `FREE`, the marker earlier generated calendars carried, even
/// though the blocks describe committed time. Consumers that expect `BUSY`
/// can opt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum FreeBusyType {
    #[default]
    Free,
    Busy,
    BusyUnavailable,
    BusyTentative,
}

impl FreeBusyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreeBusyType::Free => "FREE",
            FreeBusyType::Busy => "BUSY",
            FreeBusyType::BusyUnavailable => "BUSY-UNAVAILABLE",
            FreeBusyType::BusyTentative => "BUSY-TENTATIVE",
        }
    }
}

impl fmt::Display for FreeBusyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreeBusyType {
    type Err = ObfuscalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "FREE" => Ok(FreeBusyType::Free),
            "BUSY" => Ok(FreeBusyType::Busy),
            "BUSY-UNAVAILABLE" => Ok(FreeBusyType::BusyUnavailable),
            "BUSY-TENTATIVE" => Ok(FreeBusyType::BusyTentative),
            _ => Err(ObfuscalError::InvalidConfig(format!(
                "unknown free/busy type '{}'",
                s
            ))),
        }
    }
}

/// Everything the engine needs besides the input calendars.
///
/// Sections are kept sorted by start and never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObfuscationConfigRepr")]
pub struct ObfuscationConfig {
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
    pub timeframe: DateRange,
    pub sections: Vec<TimeOfDaySlice>,
    pub free_busy_type: FreeBusyType,
}

impl ObfuscationConfig {
    /// Build a config, sorting `sections` by start time.
    ///
    /// # Errors
    /// Returns `ObfuscalError::InvalidConfig` if `sections` is empty or two
    /// sections overlap.
    pub fn new(timezone: Tz, timeframe: DateRange, mut sections: Vec<TimeOfDaySlice>) -> Result<Self> {
        sections.sort();
        let config = Self {
            timezone,
            timeframe,
            sections,
            free_busy_type: FreeBusyType::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_free_busy_type(mut self, free_busy_type: FreeBusyType) -> Self {
        self.free_busy_type = free_busy_type;
        self
    }

    /// Check the section invariants; fields are public so a caller may have
    /// assembled the struct by hand.
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(ObfuscalError::InvalidConfig(
                "at least one section per day is required".to_string(),
            ));
        }
        for pair in self.sections.windows(2) {
            if pair[1].start < pair[0].start {
                return Err(ObfuscalError::InvalidConfig(format!(
                    "sections must be sorted by start time: {} comes after {}",
                    pair[1], pair[0]
                )));
            }
            if pair[0].overlaps(&pair[1]) {
                return Err(ObfuscalError::InvalidConfig(format!(
                    "sections {} and {} overlap",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ObfuscationConfigRepr {
    timezone: String,
    timeframe: DateRange,
    sections: Vec<TimeOfDaySlice>,
    #[serde(default)]
    free_busy_type: FreeBusyType,
}

impl TryFrom<ObfuscationConfigRepr> for ObfuscationConfig {
    type Error = ObfuscalError;

    fn try_from(repr: ObfuscationConfigRepr) -> Result<Self> {
        let tz = timezone::parse_timezone(&repr.timezone)?;
        Ok(Self::new(tz, repr.timeframe, repr.sections)?.with_free_busy_type(repr.free_busy_type))
    }
}

fn serialize_tz<S: Serializer>(tz: &Tz, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}
