//! Outbound feeder events.
//!
//! The [`StationManager`](crate::feeder::StationManager) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them or record them in a
//! test.

use crate::config::StationId;
use crate::error::HardwareError;
use crate::feeder::{MonitorExit, Rejection};

/// Structured events emitted by the feeder core.
#[derive(Debug, Clone, PartialEq)]
pub enum FeederEvent {
    /// Every station finished setup; routing may begin.
    Ready { stations: usize },

    /// A gate opened for an authorized subject.
    Opened { station: StationId, subject: String },

    /// A station refused a subject (busy or not authorized).
    Rejected {
        station: StationId,
        subject: String,
        reason: Rejection,
    },

    /// No station is assigned to this subject.
    UnknownSubject { subject: String },

    /// A subject maps to a station id the manager does not own.
    UnknownStation { station: StationId },

    /// Commanding the gate open failed; the station stays idle.
    OpenFailed {
        station: StationId,
        error: HardwareError,
    },

    /// A monitoring task finished and the gate was closed.
    Closed { station: StationId, exit: MonitorExit },

    /// `close_all` finished: every task joined, every gate commanded shut.
    Shutdown { stations: usize },
}
