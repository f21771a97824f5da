// ABOUTME: Database connection management and schema migration
// ABOUTME: Opens the SQLite pool and hands out the request, thread, and membership stores

use std::time::Duration;

use docket_config::Config;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::members::SqliteMembershipStore;
use crate::requests::SqliteRequestStore;
use crate::threads::SqliteThreadStore;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file named by `config` and run migrations
    pub async fn connect(config: &Config) -> StorageResult<Self> {
        let database_path = &config.database_path;

        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StorageError::Io)?;
        }

        debug!("Connecting to database: {}", database_path.display());

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        info!("Database connection established");

        Self::migrate(pool).await
    }

    /// Private in-memory database on a single long-lived connection
    pub async fn in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::Migration)?;

        debug!("Database migrations completed");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn request_store(&self) -> SqliteRequestStore {
        SqliteRequestStore::new(self.pool.clone())
    }

    pub fn thread_store(&self) -> SqliteThreadStore {
        SqliteThreadStore::new(self.pool.clone())
    }

    pub fn membership_store(&self) -> SqliteMembershipStore {
        SqliteMembershipStore::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_database_has_schema() {
        let db = Database::in_memory().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        for expected in [
            "comments",
            "request_items",
            "request_reviewers",
            "requests",
            "threads",
            "workspace_members",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_connect_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            database_path: temp_dir.path().join("nested").join("docket.db"),
            max_connections: 2,
            ..Config::default()
        };

        let db = Database::connect(&config).await.unwrap();
        assert!(config.database_path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
