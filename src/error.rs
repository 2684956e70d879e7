//! Unified error types for the feeder controller.
//!
//! Two families exist: [`HardwareError`] for pin resolution and I/O, and
//! [`ConfigError`] for startup configuration.  Both funnel into [`Error`]
//! so the daemon's startup path can propagate either with `?`.
//!
//! Logical outcomes (unauthorized subject, busy station, unknown subject)
//! are **not** errors; they travel as typed return values and events.

use core::fmt;

use crate::config::StationId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible startup operation funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Board or pin failure.
    Hardware(HardwareError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Pin resolution or I/O failure reported by a [`Board`](crate::app::ports::Board)
/// or one of its pins.  The payload is the logical pin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// The board has no pin by this name (or it was already handed out).
    PinNotFound(String),
    /// Digital read failed.
    ReadFailed(String),
    /// Digital write failed.
    WriteFailed(String),
    /// PWM duty-cycle write failed.
    PwmFailed(String),
    /// Requested duty cycle lies outside `[0, 1]`.
    InvalidDuty,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinNotFound(pin) => write!(f, "pin '{pin}' not found"),
            Self::ReadFailed(pin) => write!(f, "read failed on pin '{pin}'"),
            Self::WriteFailed(pin) => write!(f, "write failed on pin '{pin}'"),
            Self::PwmFailed(pin) => write!(f, "PWM write failed on pin '{pin}'"),
            Self::InvalidDuty => write!(f, "duty cycle out of range"),
        }
    }
}

impl std::error::Error for HardwareError {}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A raw value could not be parsed.
    Invalid { key: String, value: String },
    /// A parsed value failed range validation.
    ValidationFailed(&'static str),
    /// A subject is assigned to a station that is not configured.
    UnknownStation { subject: String, station: StationId },
    /// The same station id appears twice.
    DuplicateStation(StationId),
    /// More stations than the controller can track.
    TooManyStations,
    /// The configuration source could not be read.
    Io(String),
    /// The configuration source was read but is not valid JSON / layout.
    Corrupted(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value '{value}' for {key}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::UnknownStation { subject, station } => {
                write!(f, "subject '{subject}' assigned to unknown station {station}")
            }
            Self::DuplicateStation(id) => write!(f, "station {id} configured twice"),
            Self::TooManyStations => write!(f, "too many stations"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Corrupted(msg) => write!(f, "corrupted config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
