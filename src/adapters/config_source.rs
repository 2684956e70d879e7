//! Configuration source adapters.
//!
//! Implements [`ConfigPort`] twice:
//!
//! - [`EnvConfig`]: the deployment's environment variables
//!   (`SERVO_<n>_PIN`, `SENSOR_<n>_PIN`, `CAT_FEEDER_<NAME>`, tunables).
//! - [`JsonFileConfig`]: a full [`FeederConfig`] as JSON on disk.
//!
//! Both validate before returning; a bad value is a startup error, never
//! silently replaced by a default.

use core::str::FromStr;
use std::collections::BTreeMap;
use std::path::PathBuf;

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::{FeederConfig, StationId};
use crate::error::ConfigError;

/// Prefix of the subject → station assignment variables.
const ASSIGNMENT_PREFIX: &str = "CAT_FEEDER_";

// ── Environment ───────────────────────────────────────────────

/// Snapshot of `(key, value)` pairs read once at construction.
pub struct EnvConfig {
    vars: BTreeMap<String, String>,
}

impl EnvConfig {
    /// Snapshot the process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.vars.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
            })
    }

    /// Fractional seconds (e.g. `0.5`) → whole milliseconds.
    fn parse_secs_as_ms(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        let Some(secs) = self.parse::<f32>(key)? else {
            return Ok(None);
        };
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::Invalid {
                key: key.to_string(),
                value: secs.to_string(),
            });
        }
        Ok(Some((secs * 1000.0).round() as u32))
    }
}

impl ConfigPort for EnvConfig {
    fn load(&self) -> Result<FeederConfig, ConfigError> {
        let mut config = FeederConfig::default();

        // --- Pins ---
        for pins in config.stations.iter_mut() {
            if let Some(pin) = self.parse(&format!("SERVO_{}_PIN", pins.id))? {
                pins.servo_pin = pin;
            }
            if let Some(pin) = self.parse(&format!("SENSOR_{}_PIN", pins.id))? {
                pins.sensor_pin = pin;
            }
        }

        // --- Assignments ---
        for (key, value) in &self.vars {
            let Some(subject) = key.strip_prefix(ASSIGNMENT_PREFIX) else {
                continue;
            };
            let station = value.trim().parse::<u8>().ok().filter(|id| *id > 0);
            match (subject.is_empty(), station) {
                (false, Some(id)) => config.assign(subject, StationId(id)),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        // --- Tunables ---
        if let Some(secs) = self.parse::<u32>("FEEDER_OPEN_TIMEOUT")? {
            config.open_timeout_ms = secs.saturating_mul(1000);
        }
        if let Some(ms) = self.parse_secs_as_ms("PRESENCE_CHECK_INTERVAL")? {
            config.presence_check_interval_ms = ms;
        }
        if let Some(ms) = self.parse_secs_as_ms("CLASSIFICATION_INTERVAL")? {
            config.classification_interval_ms = ms;
        }
        if let Some(threshold) = self.parse("CONFIDENCE_THRESHOLD")? {
            config.confidence_threshold = threshold;
        }

        config.validate()?;
        info!(
            "Config loaded from environment: {} stations, {} subjects",
            config.stations.len(),
            config.assignments.len()
        );
        Ok(config)
    }
}

// ── JSON file ─────────────────────────────────────────────────

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse and validate a config document.
    pub fn parse(json: &str) -> Result<FeederConfig, ConfigError> {
        let mut config: FeederConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        let mut assignments = BTreeMap::new();
        for (subject, id) in core::mem::take(&mut config.assignments) {
            if assignments.insert(subject.to_lowercase(), id).is_some() {
                return Err(ConfigError::Invalid {
                    key: format!("assignments.{subject}"),
                    value: "duplicate subject (names are case-insensitive)".into(),
                });
            }
        }
        config.assignments = assignments;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<FeederConfig, ConfigError> {
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", self.path.display(), e)))?;
        let config = Self::parse(&json)?;
        info!("Config loaded from {}", self.path.display());
        Ok(config)
    }
}
