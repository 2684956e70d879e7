//! System configuration parameters
//!
//! All tunable parameters for the feeder controller, built once at startup
//! and passed by reference into the [`StationManager`](crate::feeder::StationManager).
//! Values come from the environment or a JSON file via a
//! [`ConfigPort`](crate::app::ports::ConfigPort) adapter.

use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feeder::CycleTiming;
use crate::pins;

/// Upper bound on configured stations (also the monitor registry capacity).
/// Must stay a power of two: it sizes `heapless::FnvIndexMap`s.
pub const MAX_STATIONS: usize = 8;

/// Identifier of one feeding bay (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u8);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pin wiring for one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationPins {
    pub id: StationId,
    /// Gate servo output (digital enable + PWM).
    pub servo_pin: u8,
    /// Presence sensor input.
    pub sensor_pin: u8,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    // --- Stations ---
    /// Every configured station and its wiring.
    pub stations: heapless::Vec<StationPins, MAX_STATIONS>,
    /// Lower-cased subject name → owning station.
    pub assignments: BTreeMap<String, StationId>,

    // --- Open cycle ---
    /// Hard limit on how long a gate stays open (milliseconds).
    pub open_timeout_ms: u32,
    /// Presence poll interval while a gate is open (milliseconds).
    pub presence_check_interval_ms: u32,
    /// Confirmation delay after absence before closing (milliseconds).
    pub departure_grace_ms: u32,
    /// Poll interval of the blocking presence/absence helpers (milliseconds).
    pub presence_wait_poll_ms: u32,

    // --- Servo ---
    /// Gate angle when open (degrees).
    pub servo_open_angle: f32,
    /// Gate angle when closed (degrees).
    pub servo_closed_angle: f32,

    // --- Classification ---
    /// Delay between classification requests (milliseconds).
    pub classification_interval_ms: u32,
    /// Minimum confidence for a detection to count.
    pub confidence_threshold: f32,
    /// Reserved catch-all label that is never routed.
    pub ignored_label: String,
}

impl Default for FeederConfig {
    fn default() -> Self {
        let mut stations = heapless::Vec::new();
        for (id, servo_pin, sensor_pin) in pins::DEFAULT_LAYOUT {
            // DEFAULT_LAYOUT is shorter than MAX_STATIONS.
            let _ = stations.push(StationPins {
                id: StationId(id),
                servo_pin,
                sensor_pin,
            });
        }

        Self {
            stations,
            assignments: BTreeMap::new(),

            // Open cycle
            open_timeout_ms: 300_000, // 5 min
            presence_check_interval_ms: 500,
            departure_grace_ms: 2_000,
            presence_wait_poll_ms: 100,

            // Servo
            servo_open_angle: 90.0,
            servo_closed_angle: 0.0,

            // Classification
            classification_interval_ms: 1_000, // 1 Hz
            confidence_threshold: 0.7,
            ignored_label: "others".into(),
        }
    }
}

impl FeederConfig {
    /// Assign `subject` to `station`.  Names are stored lower-cased.
    pub fn assign(&mut self, subject: &str, station: StationId) {
        self.assignments.insert(subject.to_lowercase(), station);
    }

    /// Case-insensitive lookup of the station owning `subject`.
    pub fn station_for(&self, subject: &str) -> Option<StationId> {
        self.assignments.get(&subject.to_lowercase()).copied()
    }

    /// Subjects authorized at `station`; empty when none are assigned.
    pub fn authorized_subjects(&self, station: StationId) -> Vec<String> {
        self.assignments
            .iter()
            .filter(|(_, id)| **id == station)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn station_pins(&self, station: StationId) -> Option<&StationPins> {
        self.stations.iter().find(|s| s.id == station)
    }

    /// Timing of the open → monitor → close cycle.
    pub fn cycle_timing(&self) -> CycleTiming {
        CycleTiming {
            open_timeout: Duration::from_millis(self.open_timeout_ms.into()),
            presence_check_interval: Duration::from_millis(self.presence_check_interval_ms.into()),
            departure_grace: Duration::from_millis(self.departure_grace_ms.into()),
        }
    }

    pub fn presence_wait_poll(&self) -> Duration {
        Duration::from_millis(self.presence_wait_poll_ms.into())
    }

    pub fn classification_interval(&self) -> Duration {
        Duration::from_millis(self.classification_interval_ms.into())
    }

    /// Reject anything that would leave the controller half-configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::ValidationFailed("no stations configured"));
        }
        for (i, station) in self.stations.iter().enumerate() {
            if station.id.0 == 0 {
                return Err(ConfigError::ValidationFailed("station ids start at 1"));
            }
            if self.stations[..i].iter().any(|s| s.id == station.id) {
                return Err(ConfigError::DuplicateStation(station.id));
            }
        }
        for (subject, station) in &self.assignments {
            if self.station_pins(*station).is_none() {
                return Err(ConfigError::UnknownStation {
                    subject: subject.clone(),
                    station: *station,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ValidationFailed(
                "confidence_threshold must be within [0, 1]",
            ));
        }
        for angle in [self.servo_open_angle, self.servo_closed_angle] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(ConfigError::ValidationFailed(
                    "servo angles must be within [0, 180]",
                ));
            }
        }
        if self.open_timeout_ms == 0
            || self.presence_check_interval_ms == 0
            || self.presence_wait_poll_ms == 0
            || self.classification_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        Ok(())
    }
}
