//! Pet feeder control library.
//!
//! Exposes the station core, its port traits, and the host adapters for
//! integration testing and for the `petfeeder` daemon.  Nothing here
//! touches real hardware directly; boards plug in through
//! [`app::ports::Board`].

#![deny(unused_must_use)]

// Links the std time driver that `async_io_mini::Timer` runs on.
use embassy_time as _;

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod feeder;
pub mod pins;
pub mod sensors;
