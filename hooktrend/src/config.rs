//! Configuration resolution for hooktrend
//!
//! Credentials come from the command line or environment first (clap reads
//! `HOOKTHEORY_USERNAME` / `HOOKTHEORY_PASSWORD`), then from the TOML
//! `[credentials]` table. Blank values count as missing.

use hooktrend_common::config::{CredentialsConfig, HarvestConfig};
use hooktrend_common::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Hooktheory account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_credential(value: &str) -> bool {
    !value.trim().is_empty()
}

fn pick(field: &str, cli: Option<String>, toml: Option<&String>) -> Option<String> {
    let cli = cli.filter(|v| is_valid_credential(v));
    let toml = toml.filter(|v| is_valid_credential(v));

    match (cli, toml) {
        (Some(value), Some(_)) => {
            warn!(
                "{} set on command line/environment and in TOML config. \
                 Using command line/environment.",
                field
            );
            Some(value)
        }
        (Some(value), None) => Some(value),
        (None, Some(value)) => {
            info!("{} loaded from TOML config", field);
            Some(value.clone())
        }
        (None, None) => None,
    }
}

/// Resolve credentials from CLI/environment, then TOML
pub fn resolve_credentials(
    cli_username: Option<String>,
    cli_password: Option<String>,
    toml: &CredentialsConfig,
) -> Result<Credentials> {
    let username = pick("Username", cli_username, toml.username.as_ref());
    let password = pick("Password", cli_password, toml.password.as_ref());

    match (username, password) {
        (Some(username), Some(password)) => Ok(Credentials { username, password }),
        _ => Err(Error::Config(
            "Hooktheory credentials not configured. Provide them using one of:\n\
             1. Command line: --username <name> --password <password>\n\
             2. Environment: HOOKTHEORY_USERNAME / HOOKTHEORY_PASSWORD\n\
             3. TOML config: [credentials] username = \"...\", password = \"...\""
                .to_string(),
        )),
    }
}

/// Harvest settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct HarvestOverrides {
    pub target_song_count: Option<usize>,
    pub top_n: Option<usize>,
    pub max_progressions: Option<usize>,
    pub output: Option<PathBuf>,
}

impl HarvestOverrides {
    /// Apply overrides on top of TOML/default settings and validate the result
    pub fn apply(self, mut config: HarvestConfig) -> Result<HarvestConfig> {
        if let Some(target) = self.target_song_count {
            config.target_song_count = target;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(max) = self.max_progressions {
            config.max_progressions = Some(max);
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        config.validate()?;
        Ok(config)
    }
}
