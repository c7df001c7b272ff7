//! Test database utilities
//!
//! Every [`TestDatabase`] is an isolated, migrated SQLite store, in memory by
//! default or in a temporary file when a test needs a real connection pool.

use llm_batch_gateway::config::DatabaseConfig;
use llm_batch_gateway::storage::{BatchStore, SeaOrmBatchStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper providing isolated in-memory SQLite instances
#[derive(Debug, Clone)]
pub struct TestDatabase {
    inner: Arc<SeaOrmBatchStore>,
    // keeps the database file alive for file-backed stores
    _dir: Option<Arc<TempDir>>,
}

impl TestDatabase {
    /// Create a new in-memory store with the schema applied
    pub async fn new() -> Self {
        Self::connect(test_db_config(), None).await
    }

    /// Create a store in a temporary SQLite file behind a pool of
    /// `max_connections`, so concurrent callers hold separate connections
    pub async fn file_backed(max_connections: u32) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("gateway.db").display()),
            max_connections,
            connection_timeout: 5,
        };
        Self::connect(config, Some(Arc::new(dir))).await
    }

    async fn connect(config: DatabaseConfig, dir: Option<Arc<TempDir>>) -> Self {
        let store = SeaOrmBatchStore::new(&config)
            .await
            .expect("Failed to create test database");

        store
            .migrate()
            .await
            .expect("Failed to run database migrations");

        Self {
            inner: Arc::new(store),
            _dir: dir,
        }
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &SeaOrmBatchStore {
        &self.inner
    }

    /// The store as the trait object the pipeline takes
    pub fn store_arc(&self) -> Arc<dyn BatchStore> {
        self.inner.clone()
    }
}

/// Helper to create a simple test database config
pub fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // an in-memory database lives in a single connection
        max_connections: 1,
        connection_timeout: 5,
    }
}
