//! Error types for the rapport core library.

use thiserror::Error;

/// Top-level error type for all rapport operations.
///
/// Only the orchestrator and the storage backends produce errors; the phase,
/// episode, profile and prompt components are total functions.
#[derive(Error, Debug)]
pub enum RapportError {
    /// Caller input was rejected before any state was touched.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A storage backend failed for a reason other than SQLite.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RapportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RapportError>;
