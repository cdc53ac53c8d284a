//! Error types and HTTP status mapping for the adapter.

use caskdb_core::CoreError;
use thiserror::Error;

/// Result type for adapter operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced by the adapter.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request (bad JSON body, unknown route, oversized body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An engine error.
    #[error(transparent)]
    Store(#[from] CoreError),
}

impl ServerError {
    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Returns the HTTP status code for this error.
    ///
    /// `NotFound` maps to 404; request-shaped failures (`TooLarge`,
    /// `WrongType`, malformed bodies) to 400; everything else to 500.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Store(CoreError::NotFound) => 404,
            Self::Store(CoreError::TooLarge { .. } | CoreError::WrongType { .. }) => 400,
            Self::Store(_) => 500,
        }
    }
}
