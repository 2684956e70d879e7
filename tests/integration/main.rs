//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against simulated adapters.  All tests run on the host with no real
//! hardware required.

mod control_tests;
mod hal_tests;
mod manager_tests;
