//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                  |
//! |-----------------|--------------------|------------------------------|
//! | `config_source` | ConfigPort         | Process env / JSON file      |
//! | `hal`           | Board, PinHandle   | Any embedded-hal 1.0 pin     |
//! | `log_sink`      | EventSink          | `log` facade                 |
//! | `sim`           | Board, PinHandle   | In-memory pins (tests, demo) |
//! |                 | VisionPort         | Scripted detections          |

pub mod config_source;
pub mod hal;
pub mod log_sink;
pub mod sim;
