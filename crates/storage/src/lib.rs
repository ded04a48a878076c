//! Storage adapter contract for cached translation resources.
//!
//! Two logical tables sit behind a [`StorageAdapter`]: resource metadata
//! (one row per `server/owner/language/id`) and resource content (one row
//! per [`ContentKey`]). Adapters own no business logic; deciding *when* to
//! read or refresh is the resource manager's job.

pub mod backend;
pub mod error;
mod key;
pub mod models;

pub use crate::backend::{MemoryStorage, Operation, StorageAdapter, Transaction};
pub use crate::key::{ContentKey, MULTI_SEGMENT_RESOURCES, ResourceKey, has_multi_segment_content};
use std::sync::Arc;

pub type StorageHandle = Arc<dyn StorageAdapter + Send + Sync>;
