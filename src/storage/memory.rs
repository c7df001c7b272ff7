//! In-process batch store

use super::BatchStore;
use crate::core::batch::{Batch, MergeOutcome, ModelResult, Word, WordResult};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug)]
struct BatchEntry {
    batch: Batch,
    words: Vec<Word>,
    /// word id -> input position
    positions: HashMap<String, usize>,
    /// Words merged as a result or a failure
    recorded: HashSet<String>,
    enqueued: BTreeSet<u32>,
}

impl BatchEntry {
    fn position(&self, batch_id: &str, word_id: &str) -> Result<usize> {
        self.positions.get(word_id).copied().ok_or_else(|| {
            GatewayError::not_found(format!("Word {} not found in batch {}", word_id, batch_id))
        })
    }

    fn touch(&mut self) {
        self.batch.status = self.batch.progress.status();
        self.batch.updated_at = Utc::now();
    }
}

/// `DashMap`-backed store. Each merge runs under its batch's entry lock, so
/// merges into one batch are serialized and different batches never contend.
#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    batches: DashMap<String, BatchEntry>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    fn missing(batch_id: &str) -> GatewayError {
        GatewayError::not_found(format!("Batch {} not found", batch_id))
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    async fn create_batch(&self, batch_id: &str, words: &[Word]) -> Result<Batch> {
        let total = u32::try_from(words.len())
            .map_err(|_| GatewayError::invalid_request("Batch is too large"))?;

        match self.batches.entry(batch_id.to_string()) {
            Entry::Occupied(_) => Err(GatewayError::conflict(format!(
                "Batch {} already exists",
                batch_id
            ))),
            Entry::Vacant(slot) => {
                let batch = Batch::new(batch_id, total);
                let positions = words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (w.id.clone(), i))
                    .collect();
                slot.insert(BatchEntry {
                    batch: batch.clone(),
                    words: words.to_vec(),
                    positions,
                    recorded: HashSet::new(),
                    enqueued: BTreeSet::new(),
                });
                debug!(batch_id = %batch_id, total, "Created batch");
                Ok(batch)
            }
        }
    }

    async fn merge_word_result(
        &self,
        batch_id: &str,
        word_id: &str,
        results: Vec<ModelResult>,
    ) -> Result<MergeOutcome> {
        let mut entry = self
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| Self::missing(batch_id))?;

        let position = entry.position(batch_id, word_id)?;
        if entry.recorded.contains(word_id) {
            return Ok(MergeOutcome::duplicate());
        }

        // output stays in input order regardless of merge order
        let insert_at = entry
            .batch
            .output
            .iter()
            .position(|r| entry.positions.get(&r.word_id).is_some_and(|p| *p > position))
            .unwrap_or(entry.batch.output.len());
        entry.batch.output.insert(
            insert_at,
            WordResult {
                word_id: word_id.to_string(),
                results,
            },
        );
        entry.recorded.insert(word_id.to_string());
        entry.batch.progress.completed += 1;
        entry.touch();

        Ok(MergeOutcome::applied())
    }

    async fn merge_word_failure(
        &self,
        batch_id: &str,
        word_id: &str,
        error: &str,
    ) -> Result<MergeOutcome> {
        let mut entry = self
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| Self::missing(batch_id))?;

        entry.position(batch_id, word_id)?;
        if entry.recorded.contains(word_id) {
            return Ok(MergeOutcome::duplicate());
        }

        entry.recorded.insert(word_id.to_string());
        entry.batch.progress.failed += 1;
        entry.batch.error = Some(error.to_string());
        entry.touch();

        Ok(MergeOutcome::applied())
    }

    async fn read_batch(&self, batch_id: &str) -> Result<Option<Batch>> {
        Ok(self.batches.get(batch_id).map(|entry| entry.batch.clone()))
    }

    async fn load_words(&self, batch_id: &str) -> Result<Vec<Word>> {
        self.batches
            .get(batch_id)
            .map(|entry| entry.words.clone())
            .ok_or_else(|| Self::missing(batch_id))
    }

    async fn enqueued_words(&self, batch_id: &str) -> Result<BTreeSet<u32>> {
        self.batches
            .get(batch_id)
            .map(|entry| entry.enqueued.clone())
            .ok_or_else(|| Self::missing(batch_id))
    }

    async fn mark_enqueued(&self, batch_id: &str, index: u32) -> Result<()> {
        let mut entry = self
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| Self::missing(batch_id))?;

        if index >= entry.batch.progress.total {
            return Err(GatewayError::validation(format!(
                "Word index {} out of range for batch {}",
                index, batch_id
            )));
        }
        entry.enqueued.insert(index);
        Ok(())
    }

    async fn pending_orchestrations(&self) -> Result<Vec<String>> {
        let mut pending: Vec<(chrono::DateTime<Utc>, String)> = self
            .batches
            .iter()
            .filter(|entry| (entry.enqueued.len() as u32) < entry.batch.progress.total)
            .map(|entry| (entry.batch.created_at, entry.key().clone()))
            .collect();
        pending.sort();
        Ok(pending.into_iter().map(|(_, id)| id).collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
