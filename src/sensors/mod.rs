//! Sensor drivers.

pub mod presence;
