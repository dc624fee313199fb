//! Error types for quip-core

use thiserror::Error;

/// Result type alias using quip-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quip-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value storage error
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record or conflict not found
    #[error("Not found: {0}")]
    NotFound(String),
}
