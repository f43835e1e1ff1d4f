//! # hooktrend Common Library
//!
//! Shared code for the hooktrend workspace:
//! - Error and result types
//! - TOML configuration loading and resolution
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
