//! Discrete fan speed levels and the threshold decision rules

use std::fmt;

use crate::config::Thresholds;
use crate::errors::{FanControlError, Result};

/// Discrete fan speed level. The integer value is the literal written to
/// (and read from) the cooling device control file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum FanSpeed {
    Off = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Full = 4,
}

impl FanSpeed {
    /// The integer level as written to hardware
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = FanControlError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FanSpeed::Off),
            1 => Ok(FanSpeed::Low),
            2 => Ok(FanSpeed::Medium),
            3 => Ok(FanSpeed::High),
            4 => Ok(FanSpeed::Full),
            other => Err(FanControlError::InvalidSpeed(other)),
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FanSpeed::Off => "OFF",
            FanSpeed::Low => "LOW",
            FanSpeed::Medium => "MEDIUM",
            FanSpeed::High => "HIGH",
            FanSpeed::Full => "FULL",
        };
        write!(f, "{}", name)
    }
}

/// Map a temperature to its target speed level.
///
/// Thresholds are inclusive lower bounds, checked high to low; a temperature
/// exactly on a threshold maps to that threshold's level.
pub fn target_speed(temperature: f64, thresholds: &Thresholds) -> FanSpeed {
    if temperature >= thresholds.full {
        FanSpeed::Full
    } else if temperature >= thresholds.high {
        FanSpeed::High
    } else if temperature >= thresholds.medium {
        FanSpeed::Medium
    } else if temperature >= thresholds.low {
        FanSpeed::Low
    } else {
        FanSpeed::Off
    }
}

/// Entry threshold of the level above `speed`: the temperature the fan must
/// drop a full hysteresis margin below before stepping down to `speed`.
pub fn step_down_threshold(speed: FanSpeed, thresholds: &Thresholds) -> f64 {
    match speed {
        FanSpeed::Off => thresholds.low,
        FanSpeed::Low => thresholds.medium,
        FanSpeed::Medium => thresholds.high,
        FanSpeed::High | FanSpeed::Full => thresholds.full,
    }
}

/// Decide whether a proposed speed change takes effect this cycle.
///
/// Increases (and no-op transitions) are always admitted; running the fan
/// harder than needed is preferred over reacting late. Decreases are held
/// until the temperature has dropped a full margin below the entry threshold
/// of the level being vacated, which keeps the fan from toggling at a
/// boundary. Returning false is not an error; the caller holds the current
/// speed for this cycle.
pub fn admit_transition(
    temperature: f64,
    target: FanSpeed,
    current: FanSpeed,
    thresholds: &Thresholds,
    margin: f64,
) -> bool {
    if margin <= 0.0 {
        return true;
    }

    if target > current {
        return true;
    }

    if target < current {
        let threshold = step_down_threshold(target, thresholds);
        return temperature <= threshold - margin;
    }

    true
}
