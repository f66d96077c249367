//! Error types for atoll

use thiserror::Error;

/// Result type alias for atoll operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for catalog, configuration and CLI operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository catalog error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a catalog error
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }
}
