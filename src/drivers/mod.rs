//! Actuator drivers.

pub mod servo;
