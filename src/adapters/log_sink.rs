//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`FeederEvent`] to the `log`
//! facade at the level its severity calls for.  Routine non-matches are
//! warnings; misconfiguration and hardware faults are errors.

use log::{error, info, warn};

use crate::app::events::FeederEvent;
use crate::app::ports::EventSink;
use crate::feeder::{MonitorExit, Rejection};

/// Adapter that logs every [`FeederEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &FeederEvent) {
        match event {
            FeederEvent::Ready { stations } => {
                info!("READY | {} stations set up", stations);
            }
            FeederEvent::Opened { station, subject } => {
                info!("OPEN  | feeder {} for '{}'", station, subject);
            }
            FeederEvent::Rejected {
                station,
                subject,
                reason: Rejection::Busy,
            } => {
                info!("SKIP  | feeder {} busy, ignoring '{}'", station, subject);
            }
            FeederEvent::Rejected {
                station,
                subject,
                reason: Rejection::Unauthorized,
            } => {
                warn!("DENY  | '{}' not allowed at feeder {}", subject, station);
            }
            FeederEvent::UnknownSubject { subject } => {
                warn!("DENY  | unknown subject '{}'", subject);
            }
            FeederEvent::UnknownStation { station } => {
                error!("CONF  | feeder {} not found", station);
            }
            FeederEvent::OpenFailed { station, error: e } => {
                error!("FAULT | feeder {} failed to open: {}", station, e);
            }
            FeederEvent::Closed { station, exit } => match exit {
                MonitorExit::Timeout => warn!("CLOSE | feeder {} (timeout)", station),
                MonitorExit::Departed => info!("CLOSE | feeder {} (subject left)", station),
                MonitorExit::Cancelled => info!("CLOSE | feeder {} (cancelled)", station),
                MonitorExit::Fault(e) => error!("CLOSE | feeder {} (sensor fault: {})", station, e),
            },
            FeederEvent::Shutdown { stations } => {
                info!("STOP  | {} feeders closed", stations);
            }
        }
    }
}
