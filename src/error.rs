//! Error types for the annotation workbench.

use thiserror::Error;

/// Result type used across the workbench.
pub type Result<T> = std::result::Result<T, WorkbenchError>;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// Dataset could not be fetched or read (network failure, non-2xx, missing file)
    #[error("Load error: {0}")]
    Load(String),

    /// Dataset contents are not valid JSON, or hold no usable entries
    #[error("Parse error: {0}")]
    Parse(String),

    /// No annotation widget is available to bind to the entries
    #[error("Annotation widget unavailable")]
    WidgetUnavailable,

    /// Requested dataset, entry or annotation does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameter (bad selection range, empty upload, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file could not be loaded or is malformed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for WorkbenchError {
    fn from(err: serde_json::Error) -> Self {
        WorkbenchError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for WorkbenchError {
    fn from(err: reqwest::Error) -> Self {
        WorkbenchError::Load(err.to_string())
    }
}
