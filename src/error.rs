use std::path::PathBuf;

use thiserror::Error;

/// Application level error type used throughout the crate.
#[derive(Error, Debug)]
pub enum TopoError {
    /// A source table is missing or could not be opened
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A source table does not have the expected shape
    #[error("malformed schema in {path}: {reason}")]
    MalformedSchema { path: PathBuf, reason: String },

    /// The alarm table has neither the canonical nor the synonym device name column
    #[error("alarm table {path} has no '{canonical}' or '{synonym}' column")]
    MissingJoinColumn {
        path: PathBuf,
        canonical: String,
        synonym: String,
    },

    /// The alarm table has neither the canonical nor the synonym severity column
    #[error("alarm table {path} has no '{canonical}' or '{synonym}' column")]
    MissingSeverityColumn {
        path: PathBuf,
        canonical: String,
        synonym: String,
    },

    /// A snapshot destination could not be written
    #[error("snapshot sink unavailable: {path}: {reason}")]
    SinkUnavailable { path: PathBuf, reason: String },

    /// A run was cancelled before it reached the end of the feed
    #[error("run cancelled after {steps} step(s)")]
    Cancelled { steps: usize },

    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error while encoding or decoding JSON bodies
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Requested topology file does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Request was well-formed but carried unusable values
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TopoError {
    /// True for the errors that abort a scenario before the registry is touched.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            TopoError::SourceUnavailable { .. }
                | TopoError::MalformedSchema { .. }
                | TopoError::MissingJoinColumn { .. }
                | TopoError::MissingSeverityColumn { .. }
        )
    }
}

/// Convenient alias over [`Result`] using [`TopoError`]
pub type Result<T> = std::result::Result<T, TopoError>;
