//! Error types for hooktrend

use thiserror::Error;

/// Main error type for the hooktrend crate
#[derive(Debug, Error)]
pub enum Error {
    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using hooktrend Error
pub type Result<T> = std::result::Result<T, Error>;
