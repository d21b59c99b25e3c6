//! Persistence error types.

use thiserror::Error;

/// Errors that can occur during persistence operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization error occurred.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The backend itself reported a failure (e.g. RocksDB).
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
