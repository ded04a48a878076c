//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Key string doesn't follow `server/owner/language/resource/content`.
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// A transaction was used after it was committed or rolled back.
    #[display("transaction already {_0}")]
    TransactionClosed(#[error(not(source))] &'static str),
    /// Backend-specific error (named after the backend that raised it).
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
    /// A stored row could not be encoded or decoded.
    #[display("invalid storage data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
