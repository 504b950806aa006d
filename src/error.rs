//! Error types
//!
//! Only ingestion and configuration failures are errors. A record that fails
//! normalization is silently dropped, and an empty aggregate is an empty view
//! model, so neither has a variant here.

use std::path::PathBuf;

/// The source data could not be turned into a dataset. Fatal for the session.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

/// Invalid or unreadable configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Report output failures.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
