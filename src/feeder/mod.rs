//! Feeder control core: per-station state machine and the manager that
//! fans detections out to stations.
//!
//! ```text
//!  ControlLoop ──route_detection──▶ StationManager ──▶ Station::open_for_subject
//!                                        │
//!                                        └─spawn──▶ Station::monitor_and_close ──▶ ServoGate::close
//! ```
//!
//! Everything here runs on one cooperative executor.  Hardware access is
//! synchronous and never held across an `.await`.

pub mod cancel;
pub mod manager;
pub mod station;

use core::time::Duration;

use crate::error::HardwareError;

pub use cancel::CancelToken;
pub use manager::{Executor, StationManager};
pub use station::Station;

/// Task slots in the shared executor: one per possible station plus the
/// control loop and headroom.
pub const EXECUTOR_SLOTS: usize = 16;

/// Lifecycle phase of a station.  `Opening` and `Closing` are momentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationPhase {
    Idle,
    Opening,
    Monitoring,
    Closing,
}

/// Outcome of an open request that did not hit a hardware fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Opened,
    /// An open cycle is already running; the request is dropped.
    Busy,
    /// The subject is not on this station's list.
    Unauthorized,
}

impl Admission {
    pub fn is_opened(self) -> bool {
        self == Self::Opened
    }

    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Self::Opened => None,
            Self::Busy => Some(Rejection::Busy),
            Self::Unauthorized => Some(Rejection::Unauthorized),
        }
    }
}

/// Why a station turned a subject away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Busy,
    Unauthorized,
}

/// Why a monitoring task ended.  Cancellation is a normal exit, distinct
/// from a fault; every variant has already closed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    /// The open timeout elapsed with the subject still present.
    Timeout,
    /// The bay stayed empty through the grace period.
    Departed,
    /// The manager requested a stop.
    Cancelled,
    /// The presence sensor could not be read.
    Fault(HardwareError),
}

/// Timing of one open cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    /// Hard limit on how long the gate stays open.
    pub open_timeout: Duration,
    /// Sleep between presence checks while the subject is present.
    pub presence_check_interval: Duration,
    /// Confirmation delay after the bay first reads empty.
    pub departure_grace: Duration,
}
