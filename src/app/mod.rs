//! Application layer: ports, events and the classification-driven
//! control loop that sits on top of the feeder core.
//!
//! All interaction with hardware and the vision service happens through
//! **port traits** defined in [`ports`], keeping the core fully testable
//! without real peripherals.

pub mod classifier;
pub mod control;
pub mod events;
pub mod ports;
