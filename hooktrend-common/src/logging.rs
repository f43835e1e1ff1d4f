//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level so a single run can be made
//! verbose without touching the config file.

use crate::config::{LoggingConfig, TomlConfig};
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Build the filter directive for a configured level
///
/// HTTP stack crates are held at `warn` so request-level chatter does not
/// drown out harvest progress.
pub fn filter_directive(level: &str) -> String {
    format!("{},hyper=warn,reqwest=warn", level.trim())
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directive(&config.level)).map_err(|e| {
            Error::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .try_init()
        .map_err(|e| Error::Logging(format!("Tracing already initialized: {}", e)))
}

/// Report where configuration came from, once a subscriber is installed
pub fn log_config_source(config: &TomlConfig) {
    match &config.source {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => debug!("No config file found, using compiled defaults"),
    }
}
