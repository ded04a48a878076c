//! Resource Manager Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Adapter and storage failures are attached as children
//! of the kinds below.

use derive_more::{Display, Error};

/// A resource manager error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resource manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Remote failures only surface when there is no cached copy to fall back to.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manager was built without storage or without any adapters.
    #[display("resource manager not initialized: missing {_0}")]
    NotInitialized(#[error(not(source))] &'static str),
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    #[display("no {resource_type} adapter for {resource} (candidates: {candidates})")]
    AdapterNotFound { resource: String, resource_type: String, candidates: String },
    #[display("failed to fetch {key} after {attempts} attempt(s)")]
    FetchFailed { key: String, attempts: usize },
    /// Fetched payload was empty or belonged to another resource family.
    #[display("invalid content for {_0}")]
    InvalidContent(#[error(not(source))] String),
    #[display("failed to fetch metadata for {_0}")]
    MetadataFetchFailed(#[error(not(source))] String),
    /// A storage adapter operation failed.
    #[display("storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::MetadataFetchFailed(_) | Self::Storage)
    }
}
