//! Cooling device control file access with write verification
//!
//! The control file accepts an integer level 0-4 and reflects the hardware's
//! last accepted level on read. Writes are fsynced, given a short settle
//! delay, and read back; a mismatch means the hardware did not take the
//! command and the caller must re-sync its notion of the current speed.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, warn};

use crate::errors::{FanControlError, Result};
use crate::speed::FanSpeed;

/// Hardware latency allowance between write and readback
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Handle on the cooling device control file, tracking the last confirmed
/// speed. Single-writer: owned by the control loop.
#[derive(Debug)]
pub struct FanDevice {
    path: PathBuf,
    current: FanSpeed,
}

impl FanDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: FanSpeed::Off,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last confirmed speed
    pub fn current(&self) -> FanSpeed {
        self.current
    }

    /// Read the level the hardware currently reports. Any failure (missing
    /// file, unreadable, empty, unparsable, out-of-range) falls back to Off
    /// as the safe default.
    pub fn read_current(&self) -> FanSpeed {
        if !self.path.exists() {
            error!("Fan control file does not exist: {}", self.path.display());
            return FanSpeed::Off;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read current fan speed ({}), assuming OFF", e);
                return FanSpeed::Off;
            }
        };

        let Some(line) = content.lines().next().map(str::trim).filter(|l| !l.is_empty()) else {
            warn!("Fan control file is empty, assuming OFF");
            return FanSpeed::Off;
        };

        match line.parse::<u8>().map_err(|_| ()).and_then(|v| {
            FanSpeed::try_from(v).map_err(|_| ())
        }) {
            Ok(speed) => speed,
            Err(()) => {
                warn!("Invalid fan speed read from hardware: {:?}, assuming OFF", line);
                FanSpeed::Off
            }
        }
    }

    /// Adopt whatever the hardware reports as the confirmed speed. Called at
    /// startup and after a failed write.
    pub fn resync(&mut self) -> FanSpeed {
        self.current = self.read_current();
        self.current
    }

    /// Command a speed level. No-op success when the level is already the
    /// confirmed current one; otherwise write the decimal literal, force it
    /// durable, wait out the settle delay, and verify by reading back.
    ///
    /// On `WriteVerify` the confirmed speed is left untouched; the caller
    /// must `resync()` before trusting it again.
    pub fn write(&mut self, speed: FanSpeed) -> Result<()> {
        if speed == self.current {
            return Ok(());
        }

        if !self.path.exists() {
            return Err(FanControlError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("fan control file does not exist: {}", self.path.display()),
            )));
        }

        let mut file = File::create(&self.path)?;
        file.write_all(speed.as_u8().to_string().as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::thread::sleep(SETTLE_DELAY);

        let actual = self.read_current();
        if actual != speed {
            return Err(FanControlError::WriteVerify {
                expected: speed.as_u8(),
                actual: actual.as_u8(),
            });
        }

        self.current = speed;
        Ok(())
    }
}
