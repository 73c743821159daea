//! Error types for obfuscal-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObfuscalError {
    #[error("Invalid slice: {0}")]
    InvalidSlice(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The calendar input could not be read into events.
    #[error("Calendar parse error: {0}")]
    Parse(String),

    /// Recurrence data on an event could not be expanded.
    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ObfuscalError>;
