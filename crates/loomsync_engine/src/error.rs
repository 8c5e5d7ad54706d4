//! Error types for the sync engine.

use thiserror::Error;

/// Result type for remote store calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by a remote store implementation.
///
/// The engine partitions these into two classes: retryable errors keep
/// the failed operation queued and drop the connection, non-retryable
/// errors discard the offending operation and report it.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or transport failure. Always retryable.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The remote call did not complete in time. Retryable.
    #[error("remote operation timed out")]
    Timeout,

    /// The remote store rejected the request (constraint violation,
    /// malformed payload). Never retryable.
    #[error("remote rejected the request: {message}")]
    Rejected {
        /// Rejection reason as reported by the remote.
        message: String,
    },

    /// No connection is established.
    #[error("not connected to remote store")]
    NotConnected,
}

impl RemoteError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Returns true if the failed operation may be retried later.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport { .. } => true,
            RemoteError::Timeout => true,
            RemoteError::NotConnected => true,
            RemoteError::Rejected { .. } => false,
        }
    }
}

/// Errors that can occur in engine-level operations.
///
/// Local mutations never return these - the optimistic local write
/// always succeeds. Only connection establishment and explicit remote
/// operations can fail.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Settings carry no remote endpoint or credential.
    #[error("remote store not configured")]
    RemoteNotConfigured,

    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
