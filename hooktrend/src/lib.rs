//! hooktrend - Hooktheory chord trend harvester
//!
//! Authenticates against the Hooktheory API, reads chord-transition
//! probabilities, and harvests songs containing generated chord progressions
//! into a deduplicated CSV file.

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod services;

pub use error::{Error, Result};
