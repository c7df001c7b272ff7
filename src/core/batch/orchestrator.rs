//! Batch orchestration: persist the skeleton, then emit one job per word

use super::types::{Batch, JobMessage, Word, new_batch_id, validate_words};
use crate::config::PipelineConfig;
use crate::core::queue::JobQueue;
use crate::storage::BatchStore;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Retry policy for individual enqueue steps
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Attempts per word before the step is recorded as failed
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(200),
        }
    }
}

impl From<&PipelineConfig> for OrchestratorConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.enqueue_max_attempts.max(1),
            retry_delay: config.enqueue_retry_delay(),
        }
    }
}

/// Summary of one emission run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmissionReport {
    /// Words emitted during this run
    pub emitted: usize,
    /// Words skipped because an earlier run already emitted them
    pub skipped: usize,
}

/// Decomposes batches into per-word jobs.
///
/// Emission is checkpointed per word in the store, so a run that stops part
/// way can be resumed without re-emitting words that already went out. The
/// orchestrator never touches batch progress.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    store: Arc<dyn BatchStore>,
    queue: Arc<dyn JobQueue>,
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(
        store: Arc<dyn BatchStore>,
        queue: Arc<dyn JobQueue>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Validate `words` and persist a QUEUED batch for them
    pub async fn create(&self, words: Vec<Word>) -> Result<Batch> {
        validate_words(&words)?;

        let batch_id = new_batch_id();
        let batch = self.store.create_batch(&batch_id, &words).await?;
        info!(batch_id = %batch_id, total = words.len(), "Batch created");
        Ok(batch)
    }

    /// Emit one job per word, in input order, skipping words already emitted.
    ///
    /// Every remaining word is attempted even when an earlier one fails; the
    /// words that could not be emitted are reported in [`GatewayError::Enqueue`].
    pub async fn submit(&self, batch_id: &str, words: &[Word]) -> Result<EmissionReport> {
        let emitted_before = self.store.enqueued_words(batch_id).await?;
        let mut report = EmissionReport::default();
        let mut failed = Vec::new();

        for (index, word) in words.iter().enumerate() {
            let index = u32::try_from(index)
                .map_err(|_| GatewayError::invalid_request("Batch is too large"))?;

            if emitted_before.contains(&index) {
                report.skipped += 1;
                continue;
            }

            match self.emit(batch_id, index, word).await {
                Ok(()) => report.emitted += 1,
                Err(e) => {
                    warn!(
                        batch_id = %batch_id,
                        word_id = %word.id,
                        error = %e,
                        "Giving up on enqueue step"
                    );
                    failed.push(word.id.clone());
                }
            }
        }

        if !failed.is_empty() {
            return Err(GatewayError::Enqueue {
                batch_id: batch_id.to_string(),
                failed,
            });
        }

        debug!(
            batch_id = %batch_id,
            emitted = report.emitted,
            skipped = report.skipped,
            "Batch emission finished"
        );
        Ok(report)
    }

    /// One checkpointed step with bounded retries
    async fn emit(&self, batch_id: &str, index: u32, word: &Word) -> Result<()> {
        let mut attempt = 1;
        loop {
            let step = async {
                self.queue
                    .enqueue(JobMessage::new(batch_id, word.clone()))
                    .await?;
                self.store.mark_enqueued(batch_id, index).await?;
                Ok::<_, GatewayError>(())
            };

            match step.await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.max_attempts => {
                    debug!(
                        batch_id = %batch_id,
                        word_id = %word.id,
                        attempt,
                        error = %e,
                        "Enqueue step failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reload a batch's words and finish its emission
    pub async fn resume(&self, batch_id: &str) -> Result<EmissionReport> {
        let words = self.store.load_words(batch_id).await?;
        self.submit(batch_id, &words).await
    }

    /// Resume every batch whose emission did not finish; returns how many
    /// batches were fully emitted
    pub async fn resume_pending(&self) -> Result<usize> {
        let pending = self.store.pending_orchestrations().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        info!("Resuming {} unfinished batch emission(s)", pending.len());
        let mut resumed = 0;
        for batch_id in pending {
            match self.resume(&batch_id).await {
                Ok(report) => {
                    info!(batch_id = %batch_id, emitted = report.emitted, "Batch emission resumed");
                    resumed += 1;
                }
                Err(e) => error!(batch_id = %batch_id, error = %e, "Batch emission still incomplete"),
            }
        }
        Ok(resumed)
    }

    /// Run [`submit`](Self::submit) in the background
    pub fn spawn(&self, batch_id: String, words: Vec<Word>) -> JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.submit(&batch_id, &words).await {
                error!(batch_id = %batch_id, error = %e, "Batch emission failed");
            }
        })
    }
}
