//! Common error types for hooktrend

use thiserror::Error;

/// Common result type for hooktrend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration and setting up logging
#[derive(Error, Debug)]
pub enum Error {
    /// Log file could not be opened
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or unparsable, missing credentials, bad log level
    #[error("Configuration error: {0}")]
    Config(String),

    /// Harvest setting out of range (zero target, top-N, length or cap)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tracing subscriber could not be installed
    #[error("Logging setup error: {0}")]
    Logging(String),
}
