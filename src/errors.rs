//! Error types for the fan controller

use thiserror::Error;

/// Result type alias for the fan controller
pub type Result<T> = std::result::Result<T, FanControlError>;

/// Main error type for the fan controller
#[derive(Error, Debug)]
pub enum FanControlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid fan speed level: {0}")]
    InvalidSpeed(u8),

    #[error("Fan speed write verification failed: wrote {expected}, read {actual}")]
    WriteVerify { expected: u8, actual: u8 },
}
