//! Storage adapter trait and implementations.
//!
//! This module defines the [`StorageAdapter`] trait, the persistence boundary
//! for cached resource metadata and content. Implementations own no business
//! logic: they store, filter, upsert, and sweep.

mod memory;
mod transaction;

pub use self::memory::MemoryStorage;
pub use self::transaction::{Operation, Transaction};
use crate::error::Result;
use crate::key::ContentKey;
use crate::models::{QuotaInfo, ResourceContent, ResourceMetadata, StorageInfo};
use async_trait::async_trait;

/// Unified interface for storage adapters.
///
/// Two logical tables live behind an adapter: resource metadata (unique per
/// `server/owner/language/id`) and resource content (unique per
/// [`ContentKey`]). Every write is an upsert, so repeating a write is
/// harmless; every batch write is atomic.
///
/// # Examples
///
/// ```
/// use scriptorium_storage::{ContentKey, StorageAdapter, error::Result};
///
/// async fn is_cached(storage: &dyn StorageAdapter, key: &str) -> Result<bool> {
///     let key = ContentKey::parse(key)?;
///     Ok(storage.get_resource_content(&key).await?.is_some())
/// }
/// ```
///
/// Queue several changes and apply them all at once:
///
/// ```
/// use scriptorium_storage::{ContentKey, StorageAdapter, error::Result};
///
/// async fn evict(storage: &dyn StorageAdapter, keys: &[ContentKey]) -> Result<()> {
///     let mut tx = storage.begin_transaction();
///     for key in keys {
///         tx.delete(key.clone())?;
///     }
///     tx.commit().await
/// }
/// ```
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Name of the adapter, used for logging and error messages.
    fn name(&self) -> &str;

    /// All metadata rows for an exact `server`/`owner`/`language` triple.
    async fn get_resource_metadata(&self, server: &str, owner: &str, language: &str)
    -> Result<Vec<ResourceMetadata>>;

    /// Upsert a batch of metadata rows. All-or-nothing.
    async fn save_resource_metadata(&self, metadata: &[ResourceMetadata]) -> Result<()>;

    /// Look up a single content row.
    async fn get_resource_content(&self, key: &ContentKey) -> Result<Option<ResourceContent>>;

    /// Upsert a single content row.
    ///
    /// Default implementation delegates to
    /// [`save_multiple_content()`](Self::save_multiple_content).
    async fn save_resource_content(&self, content: &ResourceContent) -> Result<()> {
        self.save_multiple_content(std::slice::from_ref(content)).await
    }

    /// Upsert a batch of content rows in one transaction.
    async fn save_multiple_content(&self, contents: &[ResourceContent]) -> Result<()>;

    /// Delete every content row whose `cached_until` is set and in the past,
    /// returning how many rows were removed.
    async fn clear_expired_content(&self) -> Result<u64>;

    /// Delete every content row (metadata is kept), returning how many rows
    /// were removed.
    async fn clear_all_content(&self) -> Result<u64>;

    /// Start queueing content changes. Nothing is applied until
    /// [`Transaction::commit`].
    fn begin_transaction(&self) -> Transaction<'_>;

    /// Apply queued operations atomically. Called by [`Transaction::commit`];
    /// prefer the transaction API over calling this directly.
    async fn apply(&self, operations: Vec<Operation>) -> Result<()>;

    /// Current usage counters.
    async fn get_storage_info(&self) -> Result<StorageInfo>;

    /// Usage measured against the fixed platform quota.
    async fn check_quota(&self) -> Result<QuotaInfo> {
        Ok(QuotaInfo::from(&self.get_storage_info().await?))
    }
}
