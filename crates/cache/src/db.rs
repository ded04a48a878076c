//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Schema migrations, embedded at compile time and applied on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// Reads fan out during preloads; writes are serialized by SQLite anyway.
const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Connection pool for the resource cache database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Runs for every pooled connection, not just the first one.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open (creating if missing) the cache database at `path` and bring its
    /// schema up to date.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::options().filename(path.as_ref()).create_if_missing(true);
        Self::open(options, MAX_CONNECTIONS).await
    }

    /// Open a throwaway in-memory database.
    ///
    /// Limited to a single connection: separate connections to `:memory:`
    /// would each see their own empty database. Available outside of tests so
    /// that other crates can use it in theirs.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::options().filename(":memory:");
        Self::open(options, 1).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Batch writes during a preload can briefly hold the write lock.
            .busy_timeout(BUSY_TIMEOUT)
    }

    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA temp_store = MEMORY;
                PRAGMA cache_size = -4096;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("migrating resource cache", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)?;
        tracing::info!("Resource cache schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for every pooled connection to be returned, then close them.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema() {
        let db = Database::connect_in_memory().await.unwrap();
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(tables, vec!["resource_content", "resource_metadata", "storage_usage"]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storage_usage").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count, 1, "usage singleton is seeded exactly once");
        db.close().await;
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let db = Database::connect(&path).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(mode, "wal");
        db.close().await;
        assert!(path.exists());
        let reopened = Database::connect(&path).await.unwrap();
        reopened.close().await;
    }
}
