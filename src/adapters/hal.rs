//! `embedded-hal` bridge.
//!
//! Lets any pin driver that implements the embedded-hal 1.0 digital and
//! PWM traits serve as a feeder [`PinHandle`].  Board crates register
//! their pins by name in a [`HalBoard`]; each name is handed out once,
//! so a pin can never be owned by two drivers.

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::warn;

use crate::app::ports::{Board, PinHandle};
use crate::error::HardwareError;

/// A named embedded-hal pin.
pub struct HalPin<P> {
    name: String,
    inner: P,
}

impl<P> HalPin<P> {
    pub fn new(name: impl Into<String>, inner: P) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P> PinHandle for HalPin<P>
where
    P: InputPin + OutputPin + SetDutyCycle,
{
    fn read_digital(&mut self) -> Result<bool, HardwareError> {
        self.inner.is_high().map_err(|e| {
            warn!("pin {}: read error {:?}", self.name, digital::Error::kind(&e));
            HardwareError::ReadFailed(self.name.clone())
        })
    }

    fn write_digital(&mut self, high: bool) -> Result<(), HardwareError> {
        let result = if high {
            self.inner.set_high()
        } else {
            self.inner.set_low()
        };
        result.map_err(|e| {
            warn!("pin {}: write error {:?}", self.name, digital::Error::kind(&e));
            HardwareError::WriteFailed(self.name.clone())
        })
    }

    fn write_pwm(&mut self, duty_cycle: f32) -> Result<(), HardwareError> {
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(HardwareError::InvalidDuty);
        }
        let max = self.inner.max_duty_cycle();
        let duty = (f32::from(max) * duty_cycle).round() as u16;
        self.inner.set_duty_cycle(duty).map_err(|e| {
            warn!("pin {}: PWM error {:?}", self.name, pwm::Error::kind(&e));
            HardwareError::PwmFailed(self.name.clone())
        })
    }
}

/// Name → pin registry over one concrete pin type.
pub struct HalBoard<P> {
    pins: Vec<HalPin<P>>,
}

impl<P> HalBoard<P> {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    /// Register `inner` under `name`, replacing any unclaimed pin of the
    /// same name.
    pub fn register(&mut self, name: impl Into<String>, inner: P) -> &mut Self {
        let pin = HalPin::new(name, inner);
        self.pins.retain(|p| p.name != pin.name);
        self.pins.push(pin);
        self
    }

    /// Names still available to resolve.
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().map(|p| p.name.as_str())
    }
}

impl<P> Default for HalBoard<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Board for HalBoard<P>
where
    P: InputPin + OutputPin + SetDutyCycle,
{
    type Pin = HalPin<P>;

    fn resolve_pin(&mut self, name: &str) -> Result<HalPin<P>, HardwareError> {
        let idx = self
            .pins
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| HardwareError::PinNotFound(name.to_string()))?;
        Ok(self.pins.swap_remove(idx))
    }
}
