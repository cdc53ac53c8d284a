//! Error types for CaskDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in CaskDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key absent from every segment's index.
    #[error("record does not exist")]
    NotFound,

    /// Encoded record exceeds the active segment size limit.
    #[error("record of {size} bytes exceeds the active segment limit of {limit} bytes")]
    TooLarge {
        /// Encoded record size.
        size: u64,
        /// Configured active segment limit.
        limit: u64,
    },

    /// Stored value cannot be parsed as the requested typed form.
    #[error("wrong type of value: {value:?} is not an int64")]
    WrongType {
        /// The stored textual value.
        value: String,
    },

    /// A record's framing is internally inconsistent or truncated mid-record.
    #[error("corrupt segment: {message}")]
    Corrupt {
        /// Description of the corruption.
        message: String,
    },

    /// Operation attempted after `close`.
    #[error("store is closed")]
    Closed,

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration issue.
        message: String,
    },
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Creates a wrong-type error.
    pub fn wrong_type(value: impl Into<String>) -> Self {
        Self::WrongType {
            value: value.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
