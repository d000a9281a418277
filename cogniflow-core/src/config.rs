//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/cogniflow/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/cogniflow/` (~/.config/cogniflow/)
//! - Data: `$XDG_DATA_HOME/cogniflow/` (~/.local/share/cogniflow/)
//! - State/Logs: `$XDG_STATE_HOME/cogniflow/` (~/.local/state/cogniflow/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Classifier adapter tuning
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Focus mode behaviour
    #[serde(default)]
    pub focus: FocusConfig,

    /// Session scoring
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Classifier adapter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Extracted text must be longer than this to be worth classifying
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    /// Text is truncated to this many characters before classification
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Classifications below this confidence go to the review queue
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f32,

    /// Upper bound on a single classification call in milliseconds
    #[serde(default = "default_classifier_timeout")]
    pub timeout_ms: u64,

    /// HTTP classification endpoint (optional)
    pub endpoint: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
            max_input_chars: default_max_input_chars(),
            review_threshold: default_review_threshold(),
            timeout_ms: default_classifier_timeout(),
            endpoint: None,
        }
    }
}

impl ClassifierConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(Error::Config(
                "classifier.review_threshold must be between 0 and 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config(
                "classifier.timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_input_chars == 0 {
            return Err(Error::Config(
                "classifier.max_input_chars must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_min_text_chars() -> usize {
    50
}

fn default_max_input_chars() -> usize {
    512
}

fn default_review_threshold() -> f32 {
    0.7
}

fn default_classifier_timeout() -> u64 {
    5000
}

/// Focus mode configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FocusConfig {
    /// Base URL of the interstitial pause page
    #[serde(default = "default_pause_page")]
    pub pause_page: String,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            pause_page: default_pause_page(),
        }
    }
}

fn default_pause_page() -> String {
    "cogniflow://pause".to_string()
}

/// Session scoring configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Minutes of active time after which a distracting URL counts as a time sink
    #[serde(default = "default_time_sink_minutes")]
    pub time_sink_minutes: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            time_sink_minutes: default_time_sink_minutes(),
        }
    }
}

impl ScoringConfig {
    /// Time sink threshold in milliseconds
    pub fn time_sink_ms(&self) -> i64 {
        (self.time_sink_minutes * 60 * 1000) as i64
    }
}

fn default_time_sink_minutes() -> u64 {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.classifier.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/cogniflow/config.toml` (~/.config/cogniflow/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("cogniflow").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("cogniflow")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("cogniflow")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/cogniflow/cogniflow.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("cogniflow.db")
    }
}
