//! Async helpers shared by the scriptorium crates.
//!
//! Currently that means a single thing: wrapping a fallible, network-facing
//! future in a timeout race and a linear-backoff retry loop.

mod retry;

pub use crate::retry::{Attempt, Exhausted, RetryPolicy};
