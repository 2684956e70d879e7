//! Gate servo driver.
//!
//! One hobby servo per station, driven through a single board pin: the
//! digital level powers the servo, the PWM duty sets its angle.
//!
//! ## Ordering contract
//!
//! - **open**: enable pin HIGH first, then the open-angle duty.
//! - **close**: closed-angle duty first, then enable pin LOW.  Dropping
//!   power before the angle is set lets the horn snap to an undefined
//!   position.
//!
//! ## Fail-safe
//!
//! Before [`ServoGate::setup`] the driver has no pin; `open`/`close` log a
//! warning and do nothing.

use log::{info, warn};

use crate::app::ports::{Board, PinHandle};
use crate::config::StationId;
use crate::error::HardwareError;
use crate::pins::{SERVO_MAX_DUTY, SERVO_MIN_DUTY};

/// Linear angle → duty-cycle map, angle clamped to `[0, 180]`.
pub fn angle_to_duty_cycle(angle: f32) -> f32 {
    let angle = angle.clamp(0.0, 180.0);
    SERVO_MIN_DUTY + (angle / 180.0) * (SERVO_MAX_DUTY - SERVO_MIN_DUTY)
}

pub struct ServoGate<P> {
    station: StationId,
    pin_id: u8,
    pin: Option<P>,
    open_angle: f32,
    closed_angle: f32,
    is_open: bool,
}

impl<P: PinHandle> ServoGate<P> {
    pub fn new(station: StationId, pin_id: u8, open_angle: f32, closed_angle: f32) -> Self {
        Self {
            station,
            pin_id,
            pin: None,
            open_angle,
            closed_angle,
            is_open: false,
        }
    }

    /// Bind the output pin.  Must run once before `open`/`close`.
    pub fn setup<B: Board<Pin = P>>(&mut self, board: &mut B) -> Result<(), HardwareError> {
        self.pin = Some(board.resolve_pin(&self.pin_id.to_string())?);
        Ok(())
    }

    pub fn open(&mut self) -> Result<(), HardwareError> {
        let Some(pin) = self.pin.as_mut() else {
            warn!("Feeder {}: servo not set up, ignoring open", self.station);
            return Ok(());
        };
        info!("Feeder {}: opening servo on pin {}", self.station, self.pin_id);
        pin.write_digital(true)?;
        pin.write_pwm(angle_to_duty_cycle(self.open_angle))?;
        self.is_open = true;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), HardwareError> {
        let Some(pin) = self.pin.as_mut() else {
            warn!("Feeder {}: servo not set up, ignoring close", self.station);
            return Ok(());
        };
        info!("Feeder {}: closing servo on pin {}", self.station, self.pin_id);
        let angle = pin.write_pwm(angle_to_duty_cycle(self.closed_angle));
        // Power goes off even when the angle could not be set.
        let enable = pin.write_digital(false);
        angle.and(enable)?;
        self.is_open = false;
        Ok(())
    }

    /// Last successfully commanded position.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_set_up(&self) -> bool {
        self.pin.is_some()
    }

    pub fn pin_id(&self) -> u8 {
        self.pin_id
    }
}
