//! Error types for cogniflow-core

use thiserror::Error;

/// Main error type for the cogniflow-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Workspace, tab or category missing
    #[error("{0} not found")]
    NotFound(String),

    /// Name collides (case-insensitive) with an existing workspace or category
    #[error("{kind} named '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    /// Blank name supplied
    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    /// URL could not be parsed or has no host
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Workspace has no saved URLs to open
    #[error("workspace '{0}' is empty")]
    Empty(String),

    /// No classification backend loaded
    #[error("classifier unavailable")]
    ClassifierUnavailable,

    /// Bulk operation where some items failed
    #[error("{failed} of {total} items failed")]
    PartialFailure { failed: usize, total: usize },

    /// Storage error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Host tab directory rejected a command
    #[error("tab directory error: {0}")]
    Directory(String),

    /// Classification backend error
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Operation exceeded its time bound
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// Short machine-readable tag for the error kind, used in command responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::DuplicateName { .. } => "duplicate_name",
            Error::EmptyName(_) => "empty_name",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Empty(_) => "empty",
            Error::ClassifierUnavailable => "classifier_unavailable",
            Error::PartialFailure { .. } => "partial_failure",
            Error::Database(_) => "database",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Config(_) => "config",
            Error::Directory(_) => "directory",
            Error::Classifier(_) => "classifier",
            Error::Timeout(_) => "timeout",
        }
    }
}

/// Result type alias for cogniflow-core
pub type Result<T> = std::result::Result<T, Error>;
