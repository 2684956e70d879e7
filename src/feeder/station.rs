//! One feeding bay: a gate servo, a presence sensor, and the subjects
//! allowed to eat there.
//!
//! ```text
//!            open_for_subject            monitor_and_close
//!   Idle ──▶ Opening ──▶ Monitoring ───────────────────────▶ Closing ──▶ Idle
//!              │ open failed                (timeout · departure ·
//!              └──────────▶ Idle             cancel · fault)
//! ```
//!
//! A station accepts one open cycle at a time.  The busy check and the
//! claim happen in one synchronous step, so on the single-threaded
//! executor two routing calls can never both win.

use core::cell::{Cell, RefCell};
use core::future::Future;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::app::ports::{Board, PinHandle};
use crate::config::StationId;
use crate::drivers::servo::ServoGate;
use crate::error::HardwareError;
use crate::sensors::presence::PresenceDetector;

use super::cancel::CancelToken;
use super::{Admission, CycleTiming, MonitorExit, StationPhase};

pub struct Station<P> {
    id: StationId,
    authorized: Vec<String>,
    gate: RefCell<ServoGate<P>>,
    detector: PresenceDetector<P>,
    timing: CycleTiming,
    phase: Cell<StationPhase>,
    last_opened_at: Cell<Option<Instant>>,
}

impl<P: PinHandle> Station<P> {
    pub fn new(
        id: StationId,
        authorized: impl IntoIterator<Item = String>,
        gate: ServoGate<P>,
        detector: PresenceDetector<P>,
        timing: CycleTiming,
    ) -> Self {
        Self {
            id,
            authorized: authorized.into_iter().map(|s| s.to_lowercase()).collect(),
            gate: RefCell::new(gate),
            detector,
            timing,
            phase: Cell::new(StationPhase::Idle),
            last_opened_at: Cell::new(None),
        }
    }

    /// Bind the gate and sensor pins.
    pub fn setup<B: Board<Pin = P>>(&self, board: &mut B) -> Result<(), HardwareError> {
        self.gate.borrow_mut().setup(board)?;
        self.detector.setup(board)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn phase(&self) -> StationPhase {
        self.phase.get()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.get() != StationPhase::Idle
    }

    pub fn last_opened_at(&self) -> Option<Instant> {
        self.last_opened_at.get()
    }

    pub fn authorized(&self) -> &[String] {
        &self.authorized
    }

    /// Last commanded gate position.
    pub fn gate_is_open(&self) -> bool {
        self.gate.borrow().is_open()
    }

    pub fn detector(&self) -> &PresenceDetector<P> {
        &self.detector
    }

    /// Case-insensitive membership test.  Independent of `busy`.
    pub fn can_access(&self, subject: &str) -> bool {
        let subject = subject.to_lowercase();
        self.authorized.iter().any(|s| *s == subject)
    }

    // ── Open ──────────────────────────────────────────────────

    /// Claim the station and open the gate for `subject`.
    ///
    /// Busy and unauthorized requests are dropped, never queued.  A
    /// hardware failure while opening returns the station to `Idle`.
    /// On success the caller owns starting [`monitor_and_close`](Self::monitor_and_close);
    /// until it completes the station stays busy.
    pub fn open_for_subject(&self, subject: &str) -> Result<Admission, HardwareError> {
        if self.is_busy() {
            debug!("Feeder {}: already busy, cannot open for '{}'", self.id, subject);
            return Ok(Admission::Busy);
        }
        if !self.can_access(subject) {
            debug!("Feeder {}: '{}' not allowed", self.id, subject);
            return Ok(Admission::Unauthorized);
        }

        info!("Feeder {}: opening for '{}'", self.id, subject);
        self.phase.set(StationPhase::Opening);
        let opened = self.gate.borrow_mut().open();
        if let Err(e) = opened {
            // The enable pin may already be high; cut it.
            self.force_close();
            self.phase.set(StationPhase::Idle);
            return Err(e);
        }
        self.last_opened_at.set(Some(Instant::now()));
        self.phase.set(StationPhase::Monitoring);
        Ok(Admission::Opened)
    }

    // ── Monitor ───────────────────────────────────────────────

    /// Hold the gate open while the subject stays, then close it.
    ///
    /// Ends on timeout, confirmed departure, cancellation, or a sensor
    /// fault.  Cleanup (close the gate, release the station) is owned by a
    /// guard created *before* the returned future is first polled, so it
    /// also runs if the future is dropped unfinished.
    pub fn monitor_and_close<'s>(
        &'s self,
        cancel: &'s CancelToken,
    ) -> impl Future<Output = MonitorExit> + 's {
        let guard = CycleGuard { station: self };
        async move {
            let exit = self.watch(cancel).await;
            match &exit {
                MonitorExit::Timeout => warn!("Feeder {}: timeout reached, closing", self.id),
                MonitorExit::Departed => info!("Feeder {}: subject left, closing", self.id),
                MonitorExit::Cancelled => info!("Feeder {}: monitoring cancelled", self.id),
                MonitorExit::Fault(e) => error!("Feeder {}: sensor fault ({}), closing", self.id, e),
            }
            drop(guard);
            exit
        }
    }

    async fn watch(&self, cancel: &CancelToken) -> MonitorExit {
        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return MonitorExit::Cancelled;
            }
            let elapsed = started.elapsed();
            if elapsed >= self.timing.open_timeout {
                return MonitorExit::Timeout;
            }

            match self.detector.is_present() {
                Err(e) => return MonitorExit::Fault(e),
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        "Feeder {}: bay empty after {:.1}s, confirming",
                        self.id,
                        elapsed.as_secs_f32()
                    );
                    if cancel.sleep(self.timing.departure_grace).await {
                        return MonitorExit::Cancelled;
                    }
                    match self.detector.is_present() {
                        Err(e) => return MonitorExit::Fault(e),
                        Ok(false) => return MonitorExit::Departed,
                        Ok(true) => {}
                    }
                }
            }

            if cancel.sleep(self.timing.presence_check_interval).await {
                return MonitorExit::Cancelled;
            }
        }
    }

    // ── Close ─────────────────────────────────────────────────

    /// Command the gate shut, logging instead of propagating failures.
    /// Does not touch the phase.
    pub fn force_close(&self) {
        if let Err(e) = self.gate.borrow_mut().close() {
            error!("Feeder {}: error closing servo: {}", self.id, e);
        }
    }

    fn finish_cycle(&self) {
        self.phase.set(StationPhase::Closing);
        self.force_close();
        self.phase.set(StationPhase::Idle);
    }
}

/// Releases the station exactly once per monitored cycle.
struct CycleGuard<'s, P: PinHandle> {
    station: &'s Station<P>,
}

impl<P: PinHandle> Drop for CycleGuard<'_, P> {
    fn drop(&mut self) {
        self.station.finish_cycle();
    }
}
