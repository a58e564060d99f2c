//! Temperature sensor reading and multi-sensor aggregation

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

/// Plausible temperature range for this hardware class, in °C
const MIN_PLAUSIBLE_C: f64 = -50.0;
const MAX_PLAUSIBLE_C: f64 = 150.0;

/// Read a single hwmon-style sensor: an integer in milli-degrees Celsius on
/// the first line. Returns None for anything unreadable or implausible; a
/// failed sensor is never an error, the caller just has one fewer reading.
///
/// Negative raw values are treated as a sensor fault rather than a
/// legitimately cold reading; well-below-zero temperatures are implausible
/// for this hardware.
pub fn read_temperature(path: &Path) -> Option<f64> {
    if !path.exists() {
        debug!("Temperature sensor path does not exist: {}", path.display());
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Failed to read temperature sensor {}: {}", path.display(), e);
            return None;
        }
    };

    let Some(line) = content.lines().next().map(str::trim).filter(|l| !l.is_empty()) else {
        debug!("Temperature sensor file is empty: {}", path.display());
        return None;
    };

    let millicelsius: i64 = match line.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid temperature value from {}: {:?}", path.display(), line);
            return None;
        }
    };

    if millicelsius < 0 {
        debug!(
            "Negative temperature read from {}: {} m°C",
            path.display(),
            millicelsius
        );
        return None;
    }

    let celsius = millicelsius as f64 / 1000.0;
    if !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&celsius) {
        warn!(
            "Unreasonable temperature read from {}: {}°C",
            path.display(),
            celsius
        );
        return None;
    }

    Some(celsius)
}

/// Mean of all readable sensors among the configured paths. Partial failure
/// is tolerated and logged; None means every sensor failed and this cycle
/// has no temperature to act on.
pub fn average_temperature(paths: &[PathBuf]) -> Option<f64> {
    let mut temps = Vec::with_capacity(paths.len());
    let mut failed = 0usize;

    for path in paths {
        match read_temperature(path) {
            Some(temp) => temps.push(temp),
            None => failed += 1,
        }
    }

    if temps.is_empty() {
        error!("All temperature sensors failed, cannot read temperature");
        return None;
    }

    if failed > 0 {
        debug!("Using {} sensor(s), {} sensor(s) failed", temps.len(), failed);
    }

    Some(temps.iter().sum::<f64>() / temps.len() as f64)
}
