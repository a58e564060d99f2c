//! The control loop: poll sensors, decide a level, drive the fan

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::config::Config;
use crate::device::FanDevice;
use crate::errors::{FanControlError, Result};
use crate::sensor;
use crate::speed::{self, FanSpeed};

/// Temperature-driven fan speed controller.
///
/// Owns the only mutable state (the confirmed fan speed, inside the device
/// handle) and drives the poll/decide/write cycle until the running flag is
/// cleared.
pub struct FanController {
    config: Config,
    device: FanDevice,
    sensors: Vec<PathBuf>,
    running: Arc<AtomicBool>,
}

impl FanController {
    pub fn new(config: Config) -> Self {
        let device = FanDevice::new(config.fan_path.clone());
        let sensors = config.sensor_paths();
        Self {
            config,
            device,
            sensors,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the signal wiring: clearing the flag stops the loop at the
    /// top of its next iteration. This is the only cross-context mutable
    /// cell; the loop polls it once per cycle.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Validate the configuration against the hardware and seed the current
    /// speed from it. Any failure here is fatal; the loop never starts.
    pub fn initialize(&mut self) -> Result<()> {
        if !Path::new(&self.config.fan_path).exists() {
            return Err(FanControlError::Config(format!(
                "Fan control file does not exist: {}",
                self.config.fan_path
            )));
        }

        if self.sensors.is_empty() {
            return Err(FanControlError::Config(
                "No temperature sensor paths configured".to_string(),
            ));
        }

        self.config.validate()?;

        let current = self.device.resync();
        let t = &self.config.thresholds;
        info!(
            "Fan controller initialized: current speed {} ({}), thresholds \
             OFF<{}°C LOW<{}°C MEDIUM<{}°C HIGH<{}°C FULL>={}°C, hysteresis={}°C",
            current,
            current.as_u8(),
            format_temperature(t.off),
            format_temperature(t.low),
            format_temperature(t.medium),
            format_temperature(t.high),
            format_temperature(t.full),
            format_temperature(self.config.hysteresis),
        );

        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Run the control loop until the running flag is cleared. The sleep is
    /// not preemptible; shutdown latency is bounded by the poll interval.
    pub async fn run(&mut self) {
        let interval = Duration::from_secs(self.config.interval_seconds);

        while self.running.load(Ordering::SeqCst) {
            self.run_cycle();
            sleep(interval).await;
        }

        info!("Fan controller stopped");
    }

    /// One poll/decide/write cycle. Every failure mode here is absorbed and
    /// logged; the next scheduled poll is the retry mechanism.
    fn run_cycle(&mut self) {
        let Some(temperature) = sensor::average_temperature(&self.sensors) else {
            debug!("Failed to read temperature, skipping this cycle");
            return;
        };

        let target = speed::target_speed(temperature, &self.config.thresholds);
        let current = self.device.current();

        let admitted = speed::admit_transition(
            temperature,
            target,
            current,
            &self.config.thresholds,
            self.config.hysteresis,
        );

        if admitted {
            if target != current {
                match self.device.write(target) {
                    Ok(()) => {
                        info!(
                            "T:{}°C S:{} -> {}",
                            format_temperature(temperature),
                            current,
                            target
                        );
                    }
                    Err(e) => {
                        warn!("Failed to set fan speed: {}", e);
                        let resynced = self.device.resync();
                        info!("Fan speed re-synced from hardware: {}", resynced);
                    }
                }
            }
        } else {
            // Held by hysteresis; per-cycle snapshot for debugging only
            debug!(
                "T:{}°C S:{}",
                format_temperature(temperature),
                current
            );
        }
    }

    /// Last confirmed fan speed
    pub fn current_speed(&self) -> FanSpeed {
        self.device.current()
    }
}

/// Fixed one-decimal formatting with a trailing ".0" trimmed: 71.0 -> "71",
/// 71.5 -> "71.5"
fn format_temperature(temp: f64) -> String {
    let formatted = format!("{:.1}", temp);
    match formatted.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => formatted,
    }
}
