//! TOML-backed run settings, overridable from the command line.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use obfuscal_engine::timezone::parse_timezone;
use obfuscal_engine::{DateRange, FreeBusyType, ObfuscationConfig, TimeOfDaySlice};
use serde::Deserialize;

/// Settings as written in a config file. Every field may be left out and
/// supplied by a flag instead.
///
/// ```toml
/// timezone = "Europe/Berlin"
/// sections = ["08:00-12:00", "13:00-18:00"]
/// free_busy_type = "FREE"
///
/// [timeframe]
/// start = "2024-03-04"
/// end = "2024-03-11"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub timezone: Option<String>,
    #[serde(default)]
    pub timeframe: Timeframe,
    pub sections: Option<Vec<TimeOfDaySlice>>,
    pub free_busy_type: Option<FreeBusyType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeframe {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Flag values that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub timezone: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sections: Vec<TimeOfDaySlice>,
    pub free_busy_type: Option<FreeBusyType>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Load from `path` if given, otherwise start from an empty config.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.timezone.is_some() {
            self.timezone = overrides.timezone;
        }
        if overrides.start.is_some() {
            self.timeframe.start = overrides.start;
        }
        if overrides.end.is_some() {
            self.timeframe.end = overrides.end;
        }
        if !overrides.sections.is_empty() {
            self.sections = Some(overrides.sections);
        }
        if overrides.free_busy_type.is_some() {
            self.free_busy_type = overrides.free_busy_type;
        }
        self
    }

    /// Resolve into a validated engine configuration.
    pub fn into_engine_config(self) -> Result<ObfuscationConfig> {
        let timezone = parse_timezone(self.timezone.as_deref().unwrap_or("UTC"))?;
        let start = self
            .timeframe
            .start
            .ok_or_else(|| anyhow!("timeframe start is required (config or --start)"))?;
        let end = self
            .timeframe
            .end
            .ok_or_else(|| anyhow!("timeframe end is required (config or --end)"))?;
        let sections = self
            .sections
            .ok_or_else(|| anyhow!("at least one section is required (config or --section)"))?;

        let config = ObfuscationConfig::new(timezone, DateRange::new(start, end)?, sections)?;
        Ok(config.with_free_busy_type(self.free_busy_type.unwrap_or_default()))
    }
}
