//! Logging setup for the fan controller
//!
//! Plain lines on stdout; under systemd that lands in the journal.

use fern::Dispatch;
use log::LevelFilter;

/// Setup logging. Verbosity comes from the command line; the config-level
/// debug flag raises the floor to Debug so per-cycle snapshots show up.
pub fn setup(verbosity: u8, debug: bool) -> Result<(), fern::InitError> {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let level = if debug { level.max(LevelFilter::Debug) } else { level };

    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(record.level(), record.target(), message)
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}

/// `timestamp [LEVEL] target: message`
fn format_line(level: log::Level, target: &str, message: &std::fmt::Arguments) -> String {
    format!(
        "{} [{}] {}: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        target,
        message
    )
}
