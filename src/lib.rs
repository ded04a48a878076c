//! Offline-first cache and sync orchestration for translation resources.
//!
//! This crate wires the workspace together: [`Config`] decides where the
//! cache lives and how the manager behaves, [`open`] builds a
//! [`ResourceManager`] over SQLite storage and the caller's remote adapters.
//!
//! ```no_run
//! use exn::ResultExt;
//! use scriptorium::error::{ErrorKind, Result};
//!
//! async fn run(adapters: Vec<scriptorium::AdapterHandle>) -> Result<()> {
//!     let config = scriptorium::Config::load(None).or_raise(|| ErrorKind::Config)?;
//!     let manager = scriptorium::open(&config, adapters).await?;
//!     let info = manager.get_storage_info().await.or_raise(|| ErrorKind::Manager)?;
//!     println!("{} cached items", info.item_count);
//!     Ok(())
//! }
//! ```

pub mod error;

use exn::ResultExt;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
pub use scriptorium_cache::{Database, SqliteStorage};
pub use scriptorium_config::{CacheConfig, Config};
pub use scriptorium_manager::{
    AdapterHandle, Context, ManagerConfig, PreloadEvent, PreloadSummary, ResourceAdapter, ResourceManager,
};
pub use scriptorium_storage::{ContentKey, MemoryStorage, ResourceKey, StorageAdapter, StorageHandle, models};

/// Open the cache database described by `config.cache`.
///
/// In-memory when asked for, or when no path is configured and the platform
/// has no cache directory.
pub async fn open_database(config: &CacheConfig) -> Result<Database> {
    let path = match config.in_memory {
        true => None,
        false => config.resolved_path(),
    };
    let Some(path) = path else {
        tracing::info!("Opening in-memory cache");
        return Database::connect_in_memory().await.or_raise(|| ErrorKind::Cache);
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::CacheDirectory(parent.display().to_string()))?;
    }
    tracing::info!(path = %path.display(), "Opening cache");
    Database::connect(&path).await.or_raise(|| ErrorKind::Cache)
}

/// Build a [`ResourceManager`] over SQLite storage and `adapters`.
pub async fn open(config: &Config, adapters: Vec<AdapterHandle>) -> Result<ResourceManager> {
    config.validate().or_raise(|| ErrorKind::Config)?;
    let db = open_database(&config.cache).await?;
    let storage: StorageHandle = Arc::new(SqliteStorage::from(db));
    ResourceManager::builder()
        .storage(storage)
        .adapters(adapters)
        .config(config.resources.clone())
        .build()
        .or_raise(|| ErrorKind::Manager)
}
