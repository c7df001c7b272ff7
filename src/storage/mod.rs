//! Storage layer for the Gateway
//!
//! Batch records, their immutable word lists and the orchestration checkpoint
//! live behind [`BatchStore`]. Two backends ship: an in-process store built on
//! `dashmap` and a SeaORM store for SQLite/PostgreSQL.

/// Database storage module
pub mod database;
/// In-memory storage module
pub mod memory;

pub use database::SeaOrmBatchStore;
pub use memory::MemoryBatchStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::batch::{Batch, MergeOutcome, ModelResult, Word};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Durable batch state shared by the orchestrator, consumer and read path.
///
/// Merges are keyed by `(batch_id, word_id)`: a second merge for the same key
/// changes nothing and reports [`MergeOutcome::already_merged`]. A word counts
/// once, whether it was merged as a result or as a failure.
#[async_trait]
pub trait BatchStore: Send + Sync + std::fmt::Debug {
    /// Persist a QUEUED skeleton and the word list. Fails with `Conflict` if
    /// the id is taken.
    async fn create_batch(&self, batch_id: &str, words: &[Word]) -> Result<Batch>;

    /// Record a word's results, bump `completed` and refresh status
    async fn merge_word_result(
        &self,
        batch_id: &str,
        word_id: &str,
        results: Vec<ModelResult>,
    ) -> Result<MergeOutcome>;

    /// Record a word as failed, bump `failed` and set the batch error
    async fn merge_word_failure(
        &self,
        batch_id: &str,
        word_id: &str,
        error: &str,
    ) -> Result<MergeOutcome>;

    /// Current snapshot, or `None` for an unknown id
    async fn read_batch(&self, batch_id: &str) -> Result<Option<Batch>>;

    /// Submitted words in input order
    async fn load_words(&self, batch_id: &str) -> Result<Vec<Word>>;

    /// Indices of words already emitted onto the queue
    async fn enqueued_words(&self, batch_id: &str) -> Result<BTreeSet<u32>>;

    /// Checkpoint that the word at `index` was emitted
    async fn mark_enqueued(&self, batch_id: &str, index: u32) -> Result<()>;

    /// Batches whose words were not all emitted
    async fn pending_orchestrations(&self) -> Result<Vec<String>>;

    /// Backend liveness
    async fn health_check(&self) -> Result<()>;
}

/// Open the store selected by `storage.backend`
pub async fn build_store(config: &StorageConfig) -> Result<Arc<dyn BatchStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory batch store");
            Ok(Arc::new(MemoryBatchStore::new()))
        }
        StorageBackend::Database => {
            let store = SeaOrmBatchStore::new(&config.database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
