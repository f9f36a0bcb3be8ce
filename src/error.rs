//! Error types with actionable diagnostics.
//!
//! Drift findings are never errors: scans and retraining attempts report
//! through structured results. These variants cover construction-time
//! failures (config, stores, HTTP clients) and dataset IO.

use crate::storage::StorageError;
use thiserror::Error;

/// Result type alias for vigilar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by vigilar entry points.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration is missing, malformed or out of range.
    #[error("Configuration error: {0}\n  → Check the YAML file passed with --config")]
    ConfigError(String),

    /// A dataset could not be read or has an unsupported layout.
    #[error("Dataset error: {0}\n  → Supported formats: .parquet, .json (records or columns)")]
    Dataset(String),

    /// Alert, job or approval store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "V001",
            Self::Dataset(_) => "V010",
            Self::Storage(_) => "V020",
            Self::Io(_) => "V050",
        }
    }

    /// Whether the user can fix this by changing input or configuration.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::Dataset(_))
    }
}
