//! Error types for [`ResourceAdapter`](super::ResourceAdapter)
//! implementations.

use derive_more::{Display, Error};

/// A resource adapter error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resource adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote service could not be reached, or answered with a failure.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The remote service does not know the requested resource or content.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The adapter does not implement this operation.
    #[display("unsupported operation: {_0}")]
    Unsupported(#[error(not(source))] &'static str),
    /// The remote answered, but the response could not be understood.
    #[display("invalid response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The call did not finish within the configured timeout.
    #[display("timed out after {_0}ms")]
    Timeout(#[error(not(source))] u64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
