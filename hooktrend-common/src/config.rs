//! Configuration loading and config file resolution
//!
//! Config file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`HOOKTREND_CONFIG`)
//! 3. Platform config directory (`~/.config/hooktrend/config.toml` on Linux)
//! 4. Compiled defaults (no file)
//!
//! A missing config file is never fatal: every setting has a built-in default.
//! A config file that exists but cannot be parsed is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HOOKTREND_CONFIG";

/// Default Hooktheory API root
pub const DEFAULT_BASE_URL: &str = "https://api.hooktheory.com/v1/";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// API endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Hooktheory account credentials (optional; CLI/env take priority)
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Harvest loop tuning
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File the configuration was read from; `None` for compiled defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// API endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, must end with `/`
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Hooktheory account credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Harvest loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Stop once this many unique songs are collected
    #[serde(default = "default_target_song_count")]
    pub target_song_count: usize,

    /// Number of most probable chords used to build progressions
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Chords per generated progression
    #[serde(default = "default_progression_length")]
    pub progression_length: usize,

    /// Fixed pause between successful page fetches
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,

    /// Rate-limit retries allowed per page before abandoning the progression
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fallback backoff base when the server gives no Retry-After
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Optional cap on the number of progressions tried
    #[serde(default)]
    pub max_progressions: Option<usize>,

    /// Pause until quota reset when X-Rate-Limit-Remaining drops to this value
    #[serde(default = "default_low_quota_threshold")]
    pub low_quota_threshold: u32,

    /// CSV output path
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_song_count: default_target_song_count(),
            top_n: default_top_n(),
            progression_length: default_progression_length(),
            page_delay_secs: default_page_delay_secs(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            max_progressions: None,
            low_quota_threshold: default_low_quota_threshold(),
            output: default_output(),
        }
    }
}

impl HarvestConfig {
    /// Reject settings that would make the harvest loop meaningless
    pub fn validate(&self) -> Result<()> {
        if self.target_song_count == 0 {
            return Err(Error::InvalidInput(
                "target_song_count must be at least 1".to_string(),
            ));
        }
        if self.top_n == 0 {
            return Err(Error::InvalidInput("top_n must be at least 1".to_string()));
        }
        if self.progression_length == 0 {
            return Err(Error::InvalidInput(
                "progression_length must be at least 1".to_string(),
            ));
        }
        if self.max_progressions == Some(0) {
            return Err(Error::InvalidInput(
                "max_progressions must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_target_song_count() -> usize {
    5000
}

fn default_top_n() -> usize {
    10
}

fn default_progression_length() -> usize {
    4
}

fn default_page_delay_secs() -> u64 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_base_secs() -> u64 {
    2
}

fn default_low_quota_threshold() -> u32 {
    2
}

fn default_output() -> PathBuf {
    PathBuf::from("all_four_chord_songs.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file to read, if any
///
/// Explicit paths (CLI or environment) are returned even if they do not exist
/// so that `load` can report them; the platform default is only returned when
/// present on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform config file location (`<config_dir>/hooktrend/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hooktrend").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

impl TomlConfig {
    /// Resolve and load configuration, falling back to compiled defaults
    ///
    /// Runs before tracing is initialised, so the chosen file is recorded in
    /// `source` for the caller to log.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
            Some(path) => {
                let mut config = load_toml_config(&path)?;
                config.source = Some(path);
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
