//! Command line argument parsing for the fan controller

use std::path::PathBuf;

use clap::Parser;

/// Pi 5 Fan Controller
///
/// Temperature-driven fan speed daemon: polls hwmon sensors and drives the
/// cooling device control file.
#[derive(Parser)]
#[command(name = "pi5-fan-controller")]
#[command(about = "Temperature-driven fan speed controller")]
#[command(version)]
pub struct Args {
    /// Path to the configuration file (default:
    /// /etc/pi5-fan-controller/pi5-fan-controller.conf when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
