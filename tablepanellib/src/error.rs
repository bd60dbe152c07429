//! Error types for tablepanellib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading panel configuration or query data.
///
/// Rendering itself never fails: formatting is total over every value shape,
/// so only structurally invalid configuration surfaces here.
#[derive(Error, Debug)]
pub enum TablePanelError {
    /// Failed to read a configuration or data file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Style pattern is not a valid regular expression
    #[error("invalid style pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Panel configuration could not be decoded
    #[error("invalid panel configuration: {0}")]
    InvalidConfig(String),

    /// Query result could not be decoded
    #[error("invalid query data: {0}")]
    InvalidData(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
