//! Pi 5 Fan Controller
//!
//! Temperature-driven fan speed daemon for the Raspberry Pi 5. Polls one or
//! more hwmon temperature sensors, maps the averaged temperature onto a
//! discrete cooling level through configurable thresholds, and writes that
//! level to the cooling device control file with hysteresis to keep the fan
//! from oscillating at threshold boundaries.

pub mod args;
pub mod config;
pub mod controller;
pub mod device;
pub mod errors;
pub mod logging;
pub mod sensor;
pub mod speed;

// Re-export commonly used types
pub use config::{Config, Thresholds};
pub use controller::FanController;
pub use device::FanDevice;
pub use errors::{FanControlError, Result};
pub use speed::FanSpeed;
