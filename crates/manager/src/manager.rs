//! The resource manager and its builder.

use exn::{OptionExt, ResultExt};
use scriptorium_asyncutils::RetryPolicy;
use scriptorium_storage::models::{QuotaInfo, StorageInfo};
use scriptorium_storage::{ContentKey, StorageHandle};
use std::sync::Arc;
use tracing::instrument;

use crate::adapter::AdapterHandle;
use crate::adapter::error::Result as AdapterResult;
use crate::config::ManagerConfig;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::registry::AdapterRegistry;
use crate::remote::RemoteFailure;

struct Inner {
    storage: StorageHandle,
    registry: AdapterRegistry,
    config: ManagerConfig,
    retry: RetryPolicy,
}

/// Orchestrates storage and remote adapters.
///
/// Decides per request whether to serve from storage or fetch, detects
/// remote changes through fingerprints, and degrades to stale cached data
/// whenever a remote call fails. Cheap to clone; clones share storage,
/// adapters and the routing map.
#[derive(Clone)]
pub struct ResourceManager {
    inner: Arc<Inner>,
}
impl ResourceManager {
    pub fn builder() -> ResourceManagerBuilder {
        ResourceManagerBuilder::default()
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.inner.storage
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// A per-call context using the configured default mode.
    pub fn context(&self) -> Context {
        Context { offline: self.inner.config.offline, force_refresh: false }
    }

    /// Run an adapter call through the timeout and retry policy.
    pub(crate) async fn remote<T, F, Fut>(&self, operation: F) -> std::result::Result<T, RemoteFailure>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        self.inner.retry.run(operation).await.map_err(RemoteFailure::from)
    }

    /// Delete the cached row for `key`. Metadata is untouched.
    #[instrument(skip(self))]
    pub async fn invalidate_cache(&self, key: &str) -> Result<()> {
        let key = ContentKey::parse(key).or_raise(|| ErrorKind::InvalidKey(key.to_string()))?;
        let mut tx = self.storage().begin_transaction();
        tx.delete(key).or_raise(|| ErrorKind::Storage)?;
        tx.commit().await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn get_storage_info(&self) -> Result<StorageInfo> {
        self.storage().get_storage_info().await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn check_quota(&self) -> Result<QuotaInfo> {
        self.storage().check_quota().await.or_raise(|| ErrorKind::Storage)
    }

    /// Sweep rows whose expiry has passed. Returns how many were removed.
    pub async fn clear_expired_content(&self) -> Result<u64> {
        self.storage().clear_expired_content().await.or_raise(|| ErrorKind::Storage)
    }

    /// Drop every content row, keeping metadata. Returns how many were
    /// removed.
    pub async fn clear_all_content(&self) -> Result<u64> {
        self.storage().clear_all_content().await.or_raise(|| ErrorKind::Storage)
    }
}

/// Builder for [`ResourceManager`].
#[derive(Default)]
pub struct ResourceManagerBuilder {
    storage: Option<StorageHandle>,
    adapters: Vec<AdapterHandle>,
    config: ManagerConfig,
}
impl ResourceManagerBuilder {
    pub fn storage(mut self, storage: StorageHandle) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn adapter(mut self, adapter: AdapterHandle) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn adapters(mut self, adapters: impl IntoIterator<Item = AdapterHandle>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails with [`ErrorKind::NotInitialized`] unless storage and at least
    /// one adapter were supplied.
    pub fn build(self) -> Result<ResourceManager> {
        let storage = self.storage.ok_or_raise(|| ErrorKind::NotInitialized("storage adapter"))?;
        if self.adapters.is_empty() {
            exn::bail!(ErrorKind::NotInitialized("resource adapters"));
        }
        let retry = self.config.retry_policy();
        Ok(ResourceManager {
            inner: Arc::new(Inner {
                storage,
                registry: AdapterRegistry::new(self.adapters),
                config: self.config,
                retry,
            }),
        })
    }
}
