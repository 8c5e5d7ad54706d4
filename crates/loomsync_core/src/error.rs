//! Error types for the Loomsync domain model.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when validating or mapping domain data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A remote row is missing a field or carries the wrong type.
    #[error("invalid row: {message}")]
    InvalidRow {
        /// Description of what was wrong with the row.
        message: String,
    },

    /// A record id string is not a valid identifier.
    #[error("invalid record id: {value}")]
    InvalidId {
        /// The offending value.
        value: String,
    },

    /// A time span string is not of the form `HH:MM:SS`.
    #[error("invalid time span: {value}")]
    InvalidSpan {
        /// The offending value.
        value: String,
    },

    /// A shift name is neither `Day` nor `Night`.
    #[error("invalid shift: {value}")]
    InvalidShift {
        /// The offending value.
        value: String,
    },

    /// A calendar date string failed to parse.
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The offending value.
        value: String,
    },
}

impl CoreError {
    /// Creates an invalid-row error.
    pub fn invalid_row(message: impl Into<String>) -> Self {
        Self::InvalidRow {
            message: message.into(),
        }
    }
}
