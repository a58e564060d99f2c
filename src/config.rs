//! Configuration loading for the fan controller
//!
//! Resolution priority: explicit `--config` file > default config file >
//! environment variables > built-in defaults. Sensor paths left unset are
//! discovered from `/sys/class/hwmon` by device name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::{FanControlError, Result};

/// Default config file location, used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pi5-fan-controller/pi5-fan-controller.conf";

/// Base directory for hwmon device discovery
const HWMON_BASE: &str = "/sys/class/hwmon";

/// Temperature thresholds in °C, one per speed level entry point
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub off: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub full: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            off: 53.0,
            low: 54.0,
            medium: 59.0,
            high: 64.0,
            full: 70.0,
        }
    }
}

impl Thresholds {
    /// Validate that thresholds are strictly ascending
    pub fn validate(&self) -> Result<()> {
        let ordered = self.off < self.low
            && self.low < self.medium
            && self.medium < self.high
            && self.high < self.full;
        if ordered {
            Ok(())
        } else {
            Err(FanControlError::Config(
                "Temperature thresholds not in ascending order".to_string(),
            ))
        }
    }
}

/// Resolved controller configuration, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct Config {
    /// Cooling device control file (integer level 0-4)
    pub fan_path: String,
    /// hwmon device name for the first sensor, used for discovery
    pub hwmon0_name: String,
    /// hwmon device name for the second sensor, used for discovery
    pub hwmon1_name: String,
    /// Explicit path for the first sensor; empty means discover by name
    pub temp_hwmon0_path: String,
    /// Explicit path for the second sensor; empty means discover by name
    pub temp_hwmon1_path: String,
    /// Hysteresis margin in °C; <= 0 disables hysteresis
    pub hysteresis: f64,
    pub thresholds: Thresholds,
    /// Poll interval in seconds
    pub interval_seconds: u64,
    /// Emit per-cycle debug snapshots
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fan_path: "/sys/class/thermal/cooling_device0/cur_state".to_string(),
            hwmon0_name: "cpu_thermal".to_string(),
            hwmon1_name: "rp1_adc".to_string(),
            temp_hwmon0_path: String::new(),
            temp_hwmon1_path: String::new(),
            hysteresis: 2.0,
            thresholds: Thresholds::default(),
            interval_seconds: 15,
            debug: false,
        }
    }
}

impl Config {
    /// Resolve the configuration sources: explicit file, then the default
    /// file if readable, then the environment, then built-in defaults.
    /// Sensor paths left unset are filled in by a separate
    /// `discover_sensors` call, so the caller can bring logging up in
    /// between and the discovery lines are not dropped.
    pub fn resolve(config_arg: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_arg {
            Self::from_file(path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
        } else {
            Self::from_env()
        }
    }

    /// Discover unset sensor paths from the system hwmon tree
    pub fn discover_sensors(&mut self) {
        self.discover_sensor_paths(Path::new(HWMON_BASE));
    }

    /// Load configuration from a key=value file, starting from defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FanControlError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::default();
        config.apply(&parse_key_value(&content))?;
        Ok(config)
    }

    /// Load configuration from environment variables, starting from defaults
    pub fn from_env() -> Result<Self> {
        let mut map = HashMap::new();
        for key in CONFIG_KEYS {
            if let Ok(value) = std::env::var(key) {
                map.insert(key.to_string(), value);
            }
        }

        let mut config = Self::default();
        config.apply(&map)?;
        Ok(config)
    }

    /// Apply a key/value map over the current values. Unknown keys are
    /// ignored; malformed numeric values are a configuration error.
    fn apply(&mut self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(v) = map.get("FAN_PATH") {
            self.fan_path = v.clone();
        }
        if let Some(v) = map.get("HWMON0_NAME") {
            self.hwmon0_name = v.clone();
        }
        if let Some(v) = map.get("HWMON1_NAME") {
            self.hwmon1_name = v.clone();
        }
        if let Some(v) = map.get("TEMP_HWMON0_PATH") {
            self.temp_hwmon0_path = v.clone();
        }
        if let Some(v) = map.get("TEMP_HWMON1_PATH") {
            self.temp_hwmon1_path = v.clone();
        }
        if let Some(v) = map.get("HYSTERESIS") {
            self.hysteresis = parse_number(v, "HYSTERESIS")?;
        }
        if let Some(v) = map.get("OFF_THRESHOLD") {
            self.thresholds.off = parse_number(v, "OFF_THRESHOLD")?;
        }
        if let Some(v) = map.get("LOW_THRESHOLD") {
            self.thresholds.low = parse_number(v, "LOW_THRESHOLD")?;
        }
        if let Some(v) = map.get("MEDIUM_THRESHOLD") {
            self.thresholds.medium = parse_number(v, "MEDIUM_THRESHOLD")?;
        }
        if let Some(v) = map.get("HIGH_THRESHOLD") {
            self.thresholds.high = parse_number(v, "HIGH_THRESHOLD")?;
        }
        if let Some(v) = map.get("FULL_THRESHOLD") {
            self.thresholds.full = parse_number(v, "FULL_THRESHOLD")?;
        }
        if let Some(v) = map.get("INTERVAL_SECONDS") {
            self.interval_seconds = v.trim().parse().map_err(|_| {
                FanControlError::Config(format!("Invalid value for INTERVAL_SECONDS: {}", v))
            })?;
        }
        if let Some(v) = map.get("DEBUG") {
            self.debug = parse_bool(v);
        }
        Ok(())
    }

    /// Fill in sensor paths that were not set explicitly by scanning the
    /// hwmon tree for the configured device names.
    pub fn discover_sensor_paths(&mut self, hwmon_base: &Path) {
        if self.temp_hwmon0_path.is_empty() {
            if let Some(path) = find_hwmon_by_name(hwmon_base, &self.hwmon0_name) {
                debug!("Discovered {} sensor at {}", self.hwmon0_name, path.display());
                self.temp_hwmon0_path = path.to_string_lossy().to_string();
            }
        }
        if self.temp_hwmon1_path.is_empty() {
            if let Some(path) = find_hwmon_by_name(hwmon_base, &self.hwmon1_name) {
                debug!("Discovered {} sensor at {}", self.hwmon1_name, path.display());
                self.temp_hwmon1_path = path.to_string_lossy().to_string();
            }
        }
    }

    /// Sensor paths that are actually configured (non-empty)
    pub fn sensor_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for path in [&self.temp_hwmon0_path, &self.temp_hwmon1_path] {
            if !path.is_empty() {
                paths.push(PathBuf::from(path));
            }
        }
        paths
    }

    /// Validate the parts of the configuration that are fatal when wrong
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.interval_seconds == 0 {
            return Err(FanControlError::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Recognized configuration keys; the environment uses the same names
const CONFIG_KEYS: &[&str] = &[
    "FAN_PATH",
    "HWMON0_NAME",
    "HWMON1_NAME",
    "TEMP_HWMON0_PATH",
    "TEMP_HWMON1_PATH",
    "HYSTERESIS",
    "OFF_THRESHOLD",
    "LOW_THRESHOLD",
    "MEDIUM_THRESHOLD",
    "HIGH_THRESHOLD",
    "FULL_THRESHOLD",
    "INTERVAL_SECONDS",
    "DEBUG",
];

/// Parse a KEY=VALUE file; `#` and `;` start comment lines, whitespace is
/// trimmed, lines without `=` or with an empty key/value are skipped.
fn parse_key_value(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim();
        if !key.is_empty() && !value.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    map
}

fn parse_number(value: &str, key: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| {
        FanControlError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Find the `temp1_input` of the hwmon device with the given name
fn find_hwmon_by_name(hwmon_base: &Path, device_name: &str) -> Option<PathBuf> {
    if device_name.is_empty() || !hwmon_base.exists() {
        return None;
    }

    let entries = fs::read_dir(hwmon_base).ok()?;

    for entry in entries.flatten() {
        let hwmon_dir = entry.path();
        if !hwmon_dir.is_dir() {
            continue;
        }
        if !hwmon_dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("hwmon"))
        {
            continue;
        }

        let Ok(name) = fs::read_to_string(hwmon_dir.join("name")) else {
            continue;
        };
        if name.trim() != device_name {
            continue;
        }

        let temp_input = hwmon_dir.join("temp1_input");
        if temp_input.exists() {
            return Some(temp_input);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fan_path, "/sys/class/thermal/cooling_device0/cur_state");
        assert_eq!(config.hwmon0_name, "cpu_thermal");
        assert_eq!(config.hwmon1_name, "rp1_adc");
        assert_eq!(config.hysteresis, 2.0);
        assert_eq!(config.interval_seconds, 15);
        assert!(!config.debug);
        assert!(config.thresholds.validate().is_ok());
    }

    #[test]
    fn test_parse_key_value_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan.conf");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "; another comment").unwrap();
        writeln!(file, "FAN_PATH = /tmp/cur_state").unwrap();
        writeln!(file, "HYSTERESIS=3.5").unwrap();
        writeln!(file, "INTERVAL_SECONDS = 5").unwrap();
        writeln!(file, "DEBUG = yes").unwrap();
        writeln!(file, "UNKNOWN_KEY = ignored").unwrap();
        writeln!(file, "not a key value line").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.fan_path, "/tmp/cur_state");
        assert_eq!(config.hysteresis, 3.5);
        assert_eq!(config.interval_seconds, 5);
        assert!(config.debug);
        // Untouched keys keep their defaults
        assert_eq!(config.thresholds.low, 54.0);
    }

    #[test]
    fn test_threshold_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan.conf");
        fs::write(
            &path,
            "OFF_THRESHOLD=40\nLOW_THRESHOLD=45\nMEDIUM_THRESHOLD=50\n\
             HIGH_THRESHOLD=55\nFULL_THRESHOLD=60\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.thresholds.off, 40.0);
        assert_eq!(config.thresholds.full, 60.0);
        assert!(config.thresholds.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_defaults() {
        // No other test reads the environment, so setting process-wide
        // variables here is safe.
        std::env::set_var("FAN_PATH", "/tmp/env_cur_state");
        std::env::set_var("HYSTERESIS", "4.5");
        std::env::set_var("DEBUG", "1");

        let config = Config::from_env().unwrap();

        std::env::remove_var("FAN_PATH");
        std::env::remove_var("HYSTERESIS");
        std::env::remove_var("DEBUG");

        assert_eq!(config.fan_path, "/tmp/env_cur_state");
        assert_eq!(config.hysteresis, 4.5);
        assert!(config.debug);
        // Variables left unset keep their defaults
        assert_eq!(config.interval_seconds, 15);
        assert_eq!(config.thresholds.full, 70.0);
    }

    #[test]
    fn test_load_then_discover_flow() {
        // Loading a config file does not touch the hwmon tree; discovery is
        // a separate step the caller runs afterwards.
        let dir = TempDir::new().unwrap();
        let conf_path = dir.path().join("fan.conf");
        fs::write(&conf_path, "HYSTERESIS = 1.5\n").unwrap();

        let hwmon0 = dir.path().join("hwmon0");
        fs::create_dir(&hwmon0).unwrap();
        fs::write(hwmon0.join("name"), "cpu_thermal\n").unwrap();
        fs::write(hwmon0.join("temp1_input"), "50000\n").unwrap();

        let mut config = Config::from_file(&conf_path).unwrap();
        assert!(config.sensor_paths().is_empty());

        config.discover_sensor_paths(dir.path());
        assert_eq!(
            config.temp_hwmon0_path,
            hwmon0.join("temp1_input").to_string_lossy()
        );
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan.conf");
        fs::write(&path, "HYSTERESIS = warm\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, FanControlError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = Config::from_file(Path::new("/nonexistent/fan.conf")).unwrap_err();
        assert!(matches!(err, FanControlError::Config(_)));
    }

    #[test]
    fn test_threshold_validation_rejects_unordered() {
        let mut thresholds = Thresholds::default();
        thresholds.medium = 70.0;
        assert!(thresholds.validate().is_err());

        // Equal neighbors are also rejected
        let mut thresholds = Thresholds::default();
        thresholds.low = thresholds.off;
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensor_paths_skips_empty() {
        let mut config = Config::default();
        assert!(config.sensor_paths().is_empty());

        config.temp_hwmon0_path = "/tmp/temp1_input".to_string();
        assert_eq!(config.sensor_paths(), vec![PathBuf::from("/tmp/temp1_input")]);
    }

    #[test]
    fn test_hwmon_discovery() {
        let dir = TempDir::new().unwrap();
        let hwmon0 = dir.path().join("hwmon0");
        let hwmon1 = dir.path().join("hwmon1");
        fs::create_dir(&hwmon0).unwrap();
        fs::create_dir(&hwmon1).unwrap();
        fs::write(hwmon0.join("name"), "rp1_adc\n").unwrap();
        fs::write(hwmon0.join("temp1_input"), "45000\n").unwrap();
        fs::write(hwmon1.join("name"), "cpu_thermal\n").unwrap();
        fs::write(hwmon1.join("temp1_input"), "52000\n").unwrap();

        let mut config = Config::default();
        config.discover_sensor_paths(dir.path());

        assert_eq!(
            config.temp_hwmon0_path,
            hwmon1.join("temp1_input").to_string_lossy()
        );
        assert_eq!(
            config.temp_hwmon1_path,
            hwmon0.join("temp1_input").to_string_lossy()
        );
    }

    #[test]
    fn test_hwmon_discovery_requires_temp_input() {
        let dir = TempDir::new().unwrap();
        let hwmon0 = dir.path().join("hwmon0");
        fs::create_dir(&hwmon0).unwrap();
        fs::write(hwmon0.join("name"), "cpu_thermal\n").unwrap();

        let mut config = Config::default();
        config.discover_sensor_paths(dir.path());
        assert!(config.temp_hwmon0_path.is_empty());
    }

    #[test]
    fn test_explicit_path_skips_discovery() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.temp_hwmon0_path = "/explicit/temp1_input".to_string();
        config.discover_sensor_paths(dir.path());
        assert_eq!(config.temp_hwmon0_path, "/explicit/temp1_input");
    }
}
