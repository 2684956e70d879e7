//! In-memory simulation adapters.
//!
//! [`SimBoard`] stands in for the GPIO board on hosts without feeder
//! hardware (development runs and every test).  Pins share their state
//! with [`SimProbe`] handles, so a test can flip a presence input or
//! inject a write failure while a station owns the pin.
//!
//! [`ScriptedVision`] replays a fixed sequence of classifications in place
//! of the camera + model service.

use core::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::app::ports::{Board, Detection, PinHandle, VisionError, VisionPort};
use crate::error::{ConfigError, HardwareError};

// ── Board ─────────────────────────────────────────────────────

/// One recorded output command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinWrite {
    Digital(bool),
    Pwm(f32),
}

#[derive(Debug, Default)]
struct SimPinState {
    input: bool,
    scripted: VecDeque<bool>,
    output: bool,
    duty: Option<f32>,
    writes: Vec<PinWrite>,
    reads: usize,
    fail_reads: bool,
    fail_writes: bool,
    fail_pwm: bool,
}

type SharedPin = Rc<RefCell<SimPinState>>;

/// Simulated board.  Unrestricted boards resolve any pin name; restricted
/// ones only the names they were built with (plus any name probed).
pub struct SimBoard {
    pins: BTreeMap<String, SharedPin>,
    restricted: bool,
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            pins: BTreeMap::new(),
            restricted: false,
        }
    }

    /// Board that only knows `names`.
    pub fn with_pins(names: &[&str]) -> Self {
        let mut board = Self {
            pins: BTreeMap::new(),
            restricted: true,
        };
        for name in names {
            board.entry(name);
        }
        board
    }

    /// Test/control handle for `name`.  Registers the pin if unknown.
    pub fn probe(&mut self, name: &str) -> SimProbe {
        SimProbe {
            state: self.entry(name),
        }
    }

    fn entry(&mut self, name: &str) -> SharedPin {
        Rc::clone(self.pins.entry(name.to_string()).or_default())
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for SimBoard {
    type Pin = SimPin;

    fn resolve_pin(&mut self, name: &str) -> Result<SimPin, HardwareError> {
        if self.restricted && !self.pins.contains_key(name) {
            return Err(HardwareError::PinNotFound(name.to_string()));
        }
        Ok(SimPin {
            name: name.to_string(),
            state: self.entry(name),
        })
    }
}

/// Pin handle given to drivers.
pub struct SimPin {
    name: String,
    state: SharedPin,
}

impl PinHandle for SimPin {
    fn read_digital(&mut self) -> Result<bool, HardwareError> {
        let mut s = self.state.borrow_mut();
        if s.fail_reads {
            return Err(HardwareError::ReadFailed(self.name.clone()));
        }
        if let Some(level) = s.scripted.pop_front() {
            s.input = level;
        }
        s.reads += 1;
        Ok(s.input)
    }

    fn write_digital(&mut self, high: bool) -> Result<(), HardwareError> {
        let mut s = self.state.borrow_mut();
        if s.fail_writes {
            return Err(HardwareError::WriteFailed(self.name.clone()));
        }
        s.output = high;
        s.writes.push(PinWrite::Digital(high));
        Ok(())
    }

    fn write_pwm(&mut self, duty_cycle: f32) -> Result<(), HardwareError> {
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(HardwareError::InvalidDuty);
        }
        let mut s = self.state.borrow_mut();
        if s.fail_writes || s.fail_pwm {
            return Err(HardwareError::PwmFailed(self.name.clone()));
        }
        s.duty = Some(duty_cycle);
        s.writes.push(PinWrite::Pwm(duty_cycle));
        Ok(())
    }
}

/// Shared view of a simulated pin.
#[derive(Clone)]
pub struct SimProbe {
    state: SharedPin,
}

impl SimProbe {
    /// Set the steady input level.
    pub fn set_input(&self, level: bool) {
        self.state.borrow_mut().input = level;
    }

    /// Queue levels returned by the next reads; each one also becomes the
    /// steady level once read.
    pub fn script_inputs(&self, levels: &[bool]) {
        self.state.borrow_mut().scripted.extend(levels.iter().copied());
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Fail PWM writes only; digital writes keep working.
    pub fn fail_pwm(&self, fail: bool) {
        self.state.borrow_mut().fail_pwm = fail;
    }

    pub fn writes(&self) -> Vec<PinWrite> {
        self.state.borrow().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    /// How many times the output was driven to `level`.
    pub fn digital_writes(&self, level: bool) -> usize {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|w| **w == PinWrite::Digital(level))
            .count()
    }

    pub fn output_high(&self) -> bool {
        self.state.borrow().output
    }

    pub fn duty(&self) -> Option<f32> {
        self.state.borrow().duty
    }

    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }
}

// ── Vision ────────────────────────────────────────────────────

/// Replays queued classification results, then reports "nothing seen".
#[derive(Debug, Default)]
pub struct ScriptedVision {
    frames: VecDeque<Result<Option<Detection>, VisionError>>,
}

impl ScriptedVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a replay: a JSON array whose items are
    /// `{"label": "...", "confidence": 0.9}` or `null` for an empty frame.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let frames: Vec<Option<Detection>> =
            serde_json::from_str(json).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        Ok(Self {
            frames: frames.into_iter().map(Ok).collect(),
        })
    }

    pub fn push_detection(&mut self, label: &str, confidence: f32) -> &mut Self {
        self.frames.push_back(Ok(Some(Detection {
            label: label.to_string(),
            confidence,
        })));
        self
    }

    pub fn push_empty(&mut self) -> &mut Self {
        self.frames.push_back(Ok(None));
        self
    }

    pub fn push_error(&mut self, error: VisionError) -> &mut Self {
        self.frames.push_back(Err(error));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VisionPort for ScriptedVision {
    fn top_classification(&mut self) -> Result<Option<Detection>, VisionError> {
        self.frames.pop_front().unwrap_or(Ok(None))
    }
}
