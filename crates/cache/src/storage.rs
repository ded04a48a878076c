//! [`StorageAdapter`] implementation over the SQLite cache database.

use async_trait::async_trait;
use exn::ResultExt;
use scriptorium_storage::error::{ErrorKind as StorageErrorKind, Result as StorageResult};
use scriptorium_storage::models::{ResourceContent, ResourceMetadata, StorageInfo};
use scriptorium_storage::{ContentKey, Operation, StorageAdapter, Transaction};
use sqlx::SqliteConnection;
use time::UtcDateTime;
use tracing::instrument;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ContentRow, MetadataRow, UsageRow};

/// Durable storage adapter backed by SQLite.
///
/// Every batch write runs in a single SQLite transaction, and the usage
/// counters are recomputed inside that same transaction so they never drift
/// from the content table.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    name: String,
    db: Database,
}
impl From<Database> for SqliteStorage {
    fn from(db: Database) -> Self {
        Self { name: "sqlite".to_string(), db }
    }
}
impl SqliteStorage {
    /// Change the name reported in logs and backend errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn backend(&self) -> StorageErrorKind {
        StorageErrorKind::Backend(self.name.clone())
    }

    async fn upsert_content(conn: &mut SqliteConnection, content: &ResourceContent) -> Result<()> {
        let row = ContentRow::try_from(content)?;
        sqlx::query(include_str!("../queries/upsert_content.sql"))
            .bind(row.key)
            .bind(row.resource_key)
            .bind(row.server)
            .bind(row.owner)
            .bind(row.language)
            .bind(row.resource_id)
            .bind(row.resource_type)
            .bind(row.book_code)
            .bind(row.article_id)
            .bind(row.content)
            .bind(row.last_fetched)
            .bind(row.cached_until)
            .bind(row.checksum)
            .bind(row.size)
            .bind(row.source_sha)
            .bind(row.source_commit)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete_content(conn: &mut SqliteConnection, key: &ContentKey) -> Result<u64> {
        let result = sqlx::query(include_str!("../queries/delete_content.sql"))
            .bind(key.to_string())
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    async fn refresh_usage(conn: &mut SqliteConnection, cleanup: Option<UtcDateTime>) -> Result<()> {
        sqlx::query(include_str!("../queries/refresh_usage.sql"))
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(at) = cleanup {
            sqlx::query(include_str!("../queries/stamp_cleanup.sql"))
                .bind(at.unix_timestamp())
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    async fn list_metadata(&self, server: &str, owner: &str, language: &str) -> Result<Vec<ResourceMetadata>> {
        let rows: Vec<MetadataRow> = sqlx::query_as(include_str!("../queries/list_metadata.sql"))
            .bind(server)
            .bind(owner)
            .bind(language)
            .fetch_all(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ResourceMetadata::try_from).collect()
    }

    async fn upsert_metadata(&self, metadata: &[ResourceMetadata]) -> Result<()> {
        let rows = metadata.iter().map(MetadataRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        for row in rows {
            sqlx::query(include_str!("../queries/upsert_metadata.sql"))
                .bind(row.server)
                .bind(row.owner)
                .bind(row.language)
                .bind(row.id)
                .bind(row.resource_type)
                .bind(row.title)
                .bind(row.description)
                .bind(row.name)
                .bind(row.version)
                .bind(row.last_updated)
                .bind(row.available)
                .bind(row.is_anchor)
                .bind(row.toc)
                .bind(row.commit_sha)
                .bind(row.file_hashes)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    async fn get_content(&self, key: &ContentKey) -> Result<Option<ResourceContent>> {
        let row: Option<ContentRow> = sqlx::query_as(include_str!("../queries/get_content.sql"))
            .bind(key.to_string())
            .fetch_optional(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ResourceContent::try_from).transpose()
    }

    async fn apply_operations(&self, operations: &[Operation]) -> Result<()> {
        let mut tx = self.db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        for operation in operations {
            match operation {
                Operation::Save(content) => Self::upsert_content(&mut *tx, content).await?,
                Operation::Delete(key) => {
                    Self::delete_content(&mut *tx, key).await?;
                },
            }
        }
        Self::refresh_usage(&mut *tx, None).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    async fn delete_where(&self, query: &'static str, expired_before: Option<UtcDateTime>) -> Result<u64> {
        let now = UtcDateTime::now();
        let mut tx = self.db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        let mut delete = sqlx::query(query);
        if let Some(before) = expired_before {
            delete = delete.bind(before.unix_timestamp());
        }
        let removed = delete.execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?.rows_affected();
        Self::refresh_usage(&mut *tx, Some(now)).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(removed)
    }

    async fn usage(&self) -> Result<StorageInfo> {
        let row: UsageRow = sqlx::query_as(include_str!("../queries/get_usage.sql"))
            .fetch_one(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        StorageInfo::try_from(row)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_resource_metadata(
        &self,
        server: &str,
        owner: &str,
        language: &str,
    ) -> StorageResult<Vec<ResourceMetadata>> {
        self.list_metadata(server, owner, language).await.or_raise(|| self.backend())
    }

    #[instrument(skip_all, fields(storage = %self.name, rows = metadata.len()))]
    async fn save_resource_metadata(&self, metadata: &[ResourceMetadata]) -> StorageResult<()> {
        self.upsert_metadata(metadata).await.or_raise(|| self.backend())
    }

    async fn get_resource_content(&self, key: &ContentKey) -> StorageResult<Option<ResourceContent>> {
        self.get_content(key).await.or_raise(|| self.backend())
    }

    #[instrument(skip_all, fields(storage = %self.name, rows = contents.len()))]
    async fn save_multiple_content(&self, contents: &[ResourceContent]) -> StorageResult<()> {
        let operations: Vec<Operation> =
            contents.iter().cloned().map(|content| Operation::Save(Box::new(content))).collect();
        self.apply_operations(&operations).await.or_raise(|| self.backend())
    }

    async fn clear_expired_content(&self) -> StorageResult<u64> {
        let removed = self
            .delete_where(include_str!("../queries/delete_expired_content.sql"), Some(UtcDateTime::now()))
            .await
            .or_raise(|| self.backend())?;
        tracing::info!(storage = %self.name, removed, "Cleared expired content");
        Ok(removed)
    }

    async fn clear_all_content(&self) -> StorageResult<u64> {
        let removed = self
            .delete_where(include_str!("../queries/delete_all_content.sql"), None)
            .await
            .or_raise(|| self.backend())?;
        tracing::info!(storage = %self.name, removed, "Cleared all content");
        Ok(removed)
    }

    fn begin_transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    #[instrument(skip_all, fields(storage = %self.name, operations = operations.len()))]
    async fn apply(&self, operations: Vec<Operation>) -> StorageResult<()> {
        self.apply_operations(&operations).await.or_raise(|| self.backend())
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        self.usage().await.or_raise(|| self.backend())
    }
}
