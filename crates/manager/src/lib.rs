//! Offline-first orchestration of cached translation resources.
//!
//! The [`ResourceManager`] sits between callers, a
//! [`StorageAdapter`](scriptorium_storage::StorageAdapter) and a set of
//! remote [`ResourceAdapter`]s. Per request it decides whether storage can
//! answer, asks the remote only when it must, and falls back to whatever
//! storage last held when the remote fails.
//!
//! # Data flow
//! caller → manager → storage (check) → adapter (miss/stale) → storage
//! (persist) → caller. On adapter failure: storage (re-stamp) → caller.

pub mod adapter;
mod config;
mod content;
mod context;
pub mod error;
mod manager;
mod metadata;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod preload;
mod registry;
mod remote;

pub use crate::adapter::{AdapterHandle, RemoteMetadata, ResourceAdapter};
pub use crate::config::ManagerConfig;
pub use crate::context::Context;
pub use crate::manager::{ResourceManager, ResourceManagerBuilder};
pub use crate::metadata::SEED_FRESHNESS;
pub use crate::preload::{MAX_PRELOAD_CONCURRENCY, PreloadEvent, PreloadSummary};
pub use crate::registry::AdapterRegistry;
