//! Error types for sceneopt

use thiserror::Error;

/// Main error type for sceneopt operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource is locked: {0}")]
    Locked(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Host error: {0}")]
    Host(String),
}

/// Result type alias for sceneopt operations
pub type Result<T> = std::result::Result<T, Error>;
