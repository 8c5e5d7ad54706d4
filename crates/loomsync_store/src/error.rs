//! Error types for cache backends.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in cache backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the underlying medium.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key contains characters that cannot be stored.
    #[error("invalid cache key: {key}")]
    InvalidKey {
        /// The offending key.
        key: String,
    },
}
