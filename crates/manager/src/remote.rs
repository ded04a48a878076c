//! Retry-wrapped adapter calls.

use exn::{Exn, ResultExt};
use scriptorium_asyncutils::{Attempt, Exhausted};

use crate::adapter::error::{Error as AdapterError, ErrorKind as AdapterErrorKind};
use crate::error::{ErrorKind, Result};

/// Every attempt at a remote call failed.
pub(crate) struct RemoteFailure {
    pub(crate) attempts: usize,
    pub(crate) source: AdapterError,
}
impl From<Exhausted<AdapterError>> for RemoteFailure {
    fn from(exhausted: Exhausted<AdapterError>) -> Self {
        let source = match exhausted.last {
            Attempt::Failed(err) => err,
            Attempt::TimedOut(after) => {
                Exn::from(AdapterErrorKind::Timeout(u64::try_from(after.as_millis()).unwrap_or(u64::MAX)))
            },
        };
        Self { attempts: exhausted.attempts, source }
    }
}
impl RemoteFailure {
    /// Raise as a manager error, keeping the adapter error as its child.
    pub(crate) fn raise<T>(self, kind: impl FnOnce(usize) -> ErrorKind) -> Result<T> {
        let attempts = self.attempts;
        Err(self.source).or_raise(|| kind(attempts))
    }
}
