//! In-process storage adapter.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use time::UtcDateTime;
use tokio::sync::RwLock;

use crate::backend::{Operation, StorageAdapter, Transaction};
use crate::error::Result;
use crate::key::{ContentKey, ResourceKey};
use crate::models::{ResourceContent, ResourceMetadata, StorageInfo};

#[derive(Default)]
struct Tables {
    metadata: BTreeMap<ResourceKey, ResourceMetadata>,
    content: HashMap<ContentKey, ResourceContent>,
    usage: StorageInfo,
}
impl Tables {
    fn upsert_content(&mut self, content: ResourceContent) {
        self.content.insert(content.key.clone(), content);
    }

    fn recompute_usage(&mut self, cleanup: Option<UtcDateTime>) {
        self.usage.item_count = self.content.len() as u64;
        self.usage.total_size = self.content.values().map(|c| c.size).sum();
        if cleanup.is_some() {
            self.usage.last_cleanup = cleanup;
        }
    }
}

/// In-memory storage adapter.
///
/// Both tables live in maps behind a single [`RwLock`], so every batch is
/// applied under one write guard and is never observed half-applied. Nothing
/// survives the process; use it for tests, or as a scratch cache when no
/// durable storage is configured.
///
/// # Examples
///
/// ```
/// use scriptorium_storage::{ContentKey, MemoryStorage, StorageAdapter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = MemoryStorage::default();
/// let key = ContentKey::parse("git.door43.org/unfoldingWord/en/ult/gen")?;
/// assert!(storage.get_resource_content(&key).await?.is_none());
/// assert_eq!(storage.get_storage_info().await?.item_count, 0);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStorage {
    name: String,
    tables: RwLock<Tables>,
}
impl MemoryStorage {
    /// Create a memory adapter pre-populated with metadata and content rows.
    pub fn with_rows(
        metadata: impl IntoIterator<Item = ResourceMetadata>,
        content: impl IntoIterator<Item = ResourceContent>,
    ) -> Self {
        let mut tables = Tables::default();
        for row in metadata {
            tables.metadata.insert(row.resource_key(), row);
        }
        for row in content {
            tables.upsert_content(row);
        }
        tables.recompute_usage(None);
        Self {
            name: "memory".to_string(),
            tables: RwLock::new(tables),
        }
    }

    /// Change the name of the memory adapter.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_rows([], [])
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_resource_metadata(
        &self,
        server: &str,
        owner: &str,
        language: &str,
    ) -> Result<Vec<ResourceMetadata>> {
        let guard = self.tables.read().await;
        Ok(guard
            .metadata
            .values()
            .filter(|m| m.server == server && m.owner == owner && m.language == language)
            .cloned()
            .collect())
    }

    async fn save_resource_metadata(&self, metadata: &[ResourceMetadata]) -> Result<()> {
        let mut guard = self.tables.write().await;
        for row in metadata {
            guard.metadata.insert(row.resource_key(), row.clone());
        }
        Ok(())
    }

    async fn get_resource_content(&self, key: &ContentKey) -> Result<Option<ResourceContent>> {
        Ok(self.tables.read().await.content.get(key).cloned())
    }

    async fn save_multiple_content(&self, contents: &[ResourceContent]) -> Result<()> {
        let mut guard = self.tables.write().await;
        for row in contents {
            guard.upsert_content(row.clone());
        }
        guard.recompute_usage(None);
        Ok(())
    }

    async fn clear_expired_content(&self) -> Result<u64> {
        let now = UtcDateTime::now();
        let mut guard = self.tables.write().await;
        let before = guard.content.len();
        guard.content.retain(|_, row| !row.is_expired(now));
        let removed = (before - guard.content.len()) as u64;
        guard.recompute_usage(Some(now));
        tracing::info!(storage = %self.name, removed, "Cleared expired content");
        Ok(removed)
    }

    async fn clear_all_content(&self) -> Result<u64> {
        let mut guard = self.tables.write().await;
        let removed = guard.content.len() as u64;
        guard.content.clear();
        guard.recompute_usage(Some(UtcDateTime::now()));
        tracing::info!(storage = %self.name, removed, "Cleared all content");
        Ok(removed)
    }

    fn begin_transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    async fn apply(&self, operations: Vec<Operation>) -> Result<()> {
        let mut guard = self.tables.write().await;
        for operation in operations {
            match operation {
                Operation::Save(content) => guard.upsert_content(*content),
                Operation::Delete(key) => {
                    guard.content.remove(&key);
                },
            }
        }
        guard.recompute_usage(None);
        Ok(())
    }

    async fn get_storage_info(&self) -> Result<StorageInfo> {
        Ok(self.tables.read().await.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrganizationType, Payload, Question, ResourceType, TocEntry};
    use time::Duration;

    fn questions(key: &str, cached_until: Option<UtcDateTime>) -> ResourceContent {
        let payload = Payload::Questions(vec![Question {
            id: "q1".to_string(),
            reference: "1:1".to_string(),
            question: "Who created the heavens and the earth?".to_string(),
            response: "God created the heavens and the earth.".to_string(),
        }]);
        let key = ContentKey::parse(key).unwrap();
        ResourceContent::new(key, ResourceType::Questions, OrganizationType::Book, payload, UtcDateTime::now())
            .unwrap()
            .with_expiry(cached_until)
    }

    fn metadata(server: &str, language: &str, id: &str) -> ResourceMetadata {
        let key = ResourceKey::new(server, "own", language, id);
        ResourceMetadata::new(key, ResourceType::Scripture, UtcDateTime::now())
    }

    #[tokio::test]
    async fn test_metadata_exact_match_filter() {
        let storage = MemoryStorage::with_rows(
            [metadata("srv", "en", "ult"), metadata("srv", "en", "ust"), metadata("srv", "fr", "ult")],
            [],
        );
        let rows = storage.get_resource_metadata("srv", "own", "en").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.language == "en"));
        assert!(storage.get_resource_metadata("other", "own", "en").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_upsert_never_duplicates() {
        let storage = MemoryStorage::default();
        let mut row = metadata("srv", "en", "ult");
        storage.save_resource_metadata(std::slice::from_ref(&row)).await.unwrap();
        row.toc = vec![TocEntry::new("gen", "Genesis")];
        storage.save_resource_metadata(&[row]).await.unwrap();
        let rows = storage.get_resource_metadata("srv", "own", "en").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].toc.len(), 1);
    }

    #[tokio::test]
    async fn test_content_upsert_and_usage() {
        let storage = MemoryStorage::default();
        let first = questions("srv/own/en/tq/gen", None);
        let second = questions("srv/own/en/tq/exo", None);
        storage.save_multiple_content(&[first.clone(), second.clone()]).await.unwrap();
        storage.save_resource_content(&first).await.unwrap();
        let info = storage.get_storage_info().await.unwrap();
        assert_eq!(info.item_count, 2);
        assert_eq!(info.total_size, first.size + second.size);
        assert_eq!(storage.get_resource_content(&first.key).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_clear_expired_content() {
        let now = UtcDateTime::now();
        let storage = MemoryStorage::with_rows(
            [],
            [
                questions("srv/own/en/tq/gen", Some(now - Duration::hours(1))),
                questions("srv/own/en/tq/exo", Some(now + Duration::hours(1))),
                questions("srv/own/en/tq/lev", None),
            ],
        );
        assert_eq!(storage.clear_expired_content().await.unwrap(), 1);
        let info = storage.get_storage_info().await.unwrap();
        assert_eq!(info.item_count, 2);
        assert!(info.last_cleanup.is_some());
        let gen_key = ContentKey::parse("srv/own/en/tq/gen").unwrap();
        assert!(storage.get_resource_content(&gen_key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_all_content_keeps_metadata() {
        let storage = MemoryStorage::with_rows(
            [metadata("srv", "en", "tq")],
            [questions("srv/own/en/tq/gen", None), questions("srv/own/en/tq/exo", None)],
        );
        assert_eq!(storage.clear_all_content().await.unwrap(), 2);
        let info = storage.get_storage_info().await.unwrap();
        assert_eq!(info.item_count, 0);
        assert_eq!(info.total_size, 0);
        assert_eq!(storage.get_resource_metadata("srv", "own", "en").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_check_quota() {
        let storage = MemoryStorage::with_rows([], [questions("srv/own/en/tq/gen", None)]);
        let quota = storage.check_quota().await.unwrap();
        assert_eq!(quota.used, storage.get_storage_info().await.unwrap().total_size);
        assert!(!quota.near_limit);
    }

    #[test]
    fn test_with_name() {
        assert_eq!(MemoryStorage::default().with_name("scratch").name(), "scratch");
    }
}
