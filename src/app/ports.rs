//! Port traits — the hexagonal boundary between feeder logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Station / StationManager / ControlLoop
//! ```
//!
//! Driven adapters (board pins, vision service, event sinks, config
//! sources) implement these traits.  The feeder core consumes them via
//! generics, so it never touches hardware or the network directly.

use crate::config::FeederConfig;
use crate::error::{ConfigError, HardwareError};

use super::events::FeederEvent;

// ───────────────────────────────────────────────────────────────
// Board port (driven adapter: GPIO / PWM)
// ───────────────────────────────────────────────────────────────

/// A single resolved pin.  Every call goes to hardware; nothing is cached.
pub trait PinHandle {
    /// Read the digital input level.
    fn read_digital(&mut self) -> Result<bool, HardwareError>;

    /// Drive the digital output level.
    fn write_digital(&mut self, high: bool) -> Result<(), HardwareError>;

    /// Set the PWM duty cycle, `0.0..=1.0`.
    fn write_pwm(&mut self, duty_cycle: f32) -> Result<(), HardwareError>;
}

/// Resolves logical pin names to handles.
pub trait Board {
    type Pin: PinHandle;

    /// Fails with [`HardwareError::PinNotFound`] if the name is unknown.
    fn resolve_pin(&mut self, name: &str) -> Result<Self::Pin, HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Vision port (driven adapter: camera + classification model)
// ───────────────────────────────────────────────────────────────

/// Top-1 result of a classification request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

/// Errors from [`VisionPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionError {
    /// Camera produced no frame.
    NoFrame,
    /// The classification service could not be reached.
    Unavailable,
    /// The service answered with something unusable.
    BadResponse,
}

impl core::fmt::Display for VisionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoFrame => write!(f, "no camera frame"),
            Self::Unavailable => write!(f, "vision service unavailable"),
            Self::BadResponse => write!(f, "bad vision response"),
        }
    }
}

/// Raw classification collaborator.  Threshold filtering happens in
/// [`SubjectClassifier`](super::classifier::SubjectClassifier), not here.
pub trait VisionPort {
    /// Classify the current camera frame.  `Ok(None)` means the model
    /// returned no classes at all.
    fn top_classification(&mut self) -> Result<Option<Detection>, VisionError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The feeder core emits structured [`FeederEvent`]s through this port.
/// Adapters decide where they go (log output, test recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &FeederEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: environment / file → domain)
// ───────────────────────────────────────────────────────────────

/// Loads the startup configuration.
///
/// Implementations MUST return a validated config; anything that would
/// leave a station unreachable or mis-wired is a [`ConfigError`].
pub trait ConfigPort {
    fn load(&self) -> Result<FeederConfig, ConfigError>;
}
