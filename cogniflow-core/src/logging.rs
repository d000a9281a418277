//! Tracing setup for the tracker
//!
//! The CLI writes to daily files `cogniflow.log.YYYY-MM-DD` in
//! `$XDG_STATE_HOME/cogniflow`. Stdout carries command results only, so
//! nothing is logged to the terminal.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FILE_PREFIX: &str = "cogniflow.log";

/// Targets that log at the configured level; dependencies stay at `warn`.
const OWN_TARGETS: &[&str] = &["cogniflow", "cogniflow_core"];

/// Filter directives for a configured level, e.g.
/// `warn,cogniflow=debug,cogniflow_core=debug`.
pub fn default_directives(level: &str) -> String {
    let level = level.trim();
    OWN_TARGETS.iter().fold(String::from("warn"), |mut out, target| {
        out.push_str(&format!(",{target}={level}"));
        out
    })
}

/// Filter for `level`; an unknown level is a config error.
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(default_directives(level))
        .map_err(|e| Error::Config(format!("invalid logging.level '{level}': {e}")))
}

/// Install the file subscriber.
///
/// `RUST_LOG`, when set, replaces the configured level entirely. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(&dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {e}")))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(dir = %dir.display(), level = %config.level, "Tracker logging started");
    Ok(LoggingGuard { _worker: guard })
}

/// Engine events in test output, filtered by `RUST_LOG`.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Flushes the background log writer on drop.
pub struct LoggingGuard {
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

/// Directory holding the rotated log files
pub fn log_dir() -> PathBuf {
    Config::state_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_level_to_tracker() {
        assert_eq!(
            default_directives(" debug "),
            "warn,cogniflow=debug,cogniflow_core=debug"
        );
    }

    #[test]
    fn test_level_filter_rejects_unknown_level() {
        assert!(level_filter("trace").is_ok());
        assert!(matches!(level_filter("chatty"), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_dir_is_state_dir() {
        assert!(log_dir().ends_with("cogniflow"));
    }
}
