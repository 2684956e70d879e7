//! Bay presence sensor (IR break-beam, digital HIGH = subject present).
//!
//! Every query re-reads the pin; the driver holds no level cache.  Before
//! [`PresenceDetector::setup`] every query reports *absent* (safe default:
//! an unbound sensor never holds a gate open).
//!
//! The wait helpers poll on the async reactor timer, so other stations'
//! monitoring tasks keep running while one of these is pending.

use core::cell::RefCell;
use core::time::Duration;
use std::time::Instant;

use async_io_mini::Timer;
use log::info;

use crate::app::ports::{Board, PinHandle};
use crate::config::StationId;
use crate::error::HardwareError;

pub struct PresenceDetector<P> {
    station: StationId,
    pin_id: u8,
    pin: RefCell<Option<P>>,
    poll_interval: Duration,
}

impl<P: PinHandle> PresenceDetector<P> {
    /// `poll_interval` paces [`wait_for_presence`](Self::wait_for_presence).
    pub fn new(station: StationId, pin_id: u8, poll_interval: Duration) -> Self {
        Self {
            station,
            pin_id,
            pin: RefCell::new(None),
            poll_interval,
        }
    }

    pub fn setup<B: Board<Pin = P>>(&self, board: &mut B) -> Result<(), HardwareError> {
        let pin = board.resolve_pin(&self.pin_id.to_string())?;
        *self.pin.borrow_mut() = Some(pin);
        Ok(())
    }

    /// Single blocking read.  `Ok(false)` before setup.
    pub fn is_present(&self) -> Result<bool, HardwareError> {
        match self.pin.borrow_mut().as_mut() {
            Some(pin) => pin.read_digital(),
            None => Ok(false),
        }
    }

    /// Poll until presence is seen or `timeout` elapses.
    pub async fn wait_for_presence(&self, timeout: Duration) -> Result<bool, HardwareError> {
        info!(
            "Feeder {}: waiting for presence (timeout: {:.1}s)",
            self.station,
            timeout.as_secs_f32()
        );
        let started = Instant::now();
        while started.elapsed() < timeout {
            if self.is_present()? {
                info!("Feeder {}: presence detected", self.station);
                return Ok(true);
            }
            Timer::after(self.poll_interval).await;
        }
        info!("Feeder {}: no presence within timeout", self.station);
        Ok(false)
    }

    /// Poll every `interval` until the bay reads empty.  Unbounded; callers
    /// that need a deadline race this against their own timer.
    pub async fn wait_for_absence(&self, interval: Duration) -> Result<(), HardwareError> {
        info!("Feeder {}: waiting for absence", self.station);
        while self.is_present()? {
            Timer::after(interval).await;
        }
        info!("Feeder {}: absence detected", self.station);
        Ok(())
    }

    pub fn is_set_up(&self) -> bool {
        self.pin.borrow().is_some()
    }

    pub fn pin_id(&self) -> u8 {
        self.pin_id
    }
}
