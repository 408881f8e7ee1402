//! Error types for ripple-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for ripple-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid JSONL format.
    #[error("Invalid JSONL format: {0}")]
    InvalidFormat(String),
}

impl Error {
    /// Returns `true` if this error means the file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// A specialized Result type for ripple-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
