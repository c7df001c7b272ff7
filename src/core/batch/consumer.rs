//! Job consumer: model fan-out, idempotent merge, ack or retry

use super::fanout::{FanOutConfig, ModelFanOut};
use super::types::{JobMessage, MergeOutcome};
use crate::config::PipelineConfig;
use crate::core::invoker::ModelInvoker;
use crate::core::queue::{Delivery, JobReceiver};
use crate::storage::BatchStore;
use crate::utils::error::{GatewayError, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Consumer tuning
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Fixed backoff before a failed job is redelivered (default: 5s)
    pub retry_delay: Duration,
    /// Dead-letter a word once its delivery attempt reaches this (default: never)
    pub max_attempts: Option<u32>,
    /// Deliveries processed concurrently (default: 16)
    pub concurrency: usize,
    /// Deliveries requested per receive (default: 32)
    pub receive_batch_size: usize,
    /// Backoff after a receive error (default: 250ms)
    pub poll_interval: Duration,
    /// Per-job model fan-out
    pub fanout: FanOutConfig,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(5),
            max_attempts: None,
            concurrency: 16,
            receive_batch_size: 32,
            poll_interval: Duration::from_millis(250),
            fanout: FanOutConfig::default(),
        }
    }
}

impl From<&PipelineConfig> for ConsumerConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            retry_delay: config.retry_delay(),
            max_attempts: config.max_attempts,
            concurrency: config.consumer_concurrency.max(1),
            receive_batch_size: config.receive_batch_size.max(1),
            poll_interval: config.poll_interval(),
            fanout: FanOutConfig::from(config),
        }
    }
}

/// How a delivery was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Results merged and the job acknowledged
    Merged,
    /// The word was already recorded; acknowledged without changes
    Duplicate,
    /// Attempts exhausted; word recorded as failed and acknowledged
    DeadLettered,
    /// The job's batch or word does not exist; acknowledged and dropped
    Dropped,
    /// Redelivery requested after the retry delay
    Retried,
}

/// Drains the job queue
#[derive(Debug, Clone)]
pub struct JobConsumer {
    store: Arc<dyn BatchStore>,
    invoker: Arc<dyn ModelInvoker>,
    fanout: ModelFanOut,
    config: ConsumerConfig,
}

impl JobConsumer {
    pub fn new(
        store: Arc<dyn BatchStore>,
        invoker: Arc<dyn ModelInvoker>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            store,
            invoker,
            fanout: ModelFanOut::new(config.fanout.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Run every model for the job's word and merge the results.
    ///
    /// Any model failure fails the job as a whole before anything is written.
    pub async fn process(&self, job: &JobMessage) -> Result<MergeOutcome> {
        let results = self
            .fanout
            .run(self.invoker.as_ref(), &job.word.prompt, &job.word.models)
            .await?;

        self.store
            .merge_word_result(&job.batch_id, &job.word.id, results)
            .await
    }

    /// Process one delivery and settle it
    pub async fn handle(&self, delivery: Box<dyn Delivery>) -> JobOutcome {
        let job = delivery.job();
        let attempt = delivery.attempt();

        let outcome = match self.process(job).await {
            Ok(merge) if merge.already_merged => {
                debug!(batch_id = %job.batch_id, word_id = %job.word.id, "Duplicate delivery");
                JobOutcome::Duplicate
            }
            Ok(_) => {
                debug!(batch_id = %job.batch_id, word_id = %job.word.id, attempt, "Word merged");
                JobOutcome::Merged
            }
            Err(GatewayError::NotFound(message)) => {
                error!(
                    batch_id = %job.batch_id,
                    word_id = %job.word.id,
                    "Dropping orphaned job: {}",
                    message
                );
                JobOutcome::Dropped
            }
            Err(e) if self.attempts_exhausted(attempt) => {
                match self.dead_letter(job, &e).await {
                    Ok(()) => JobOutcome::DeadLettered,
                    Err(merge_err) => {
                        error!(
                            batch_id = %job.batch_id,
                            word_id = %job.word.id,
                            error = %merge_err,
                            "Failed to record word failure"
                        );
                        JobOutcome::Retried
                    }
                }
            }
            Err(e) => {
                // a non-retryable model error is still retried; the transport
                // owns redelivery and dead-lettering is opt-in
                let retryable = match &e {
                    GatewayError::Invocation(inv) => inv.is_retryable(),
                    _ => true,
                };
                warn!(
                    batch_id = %job.batch_id,
                    word_id = %job.word.id,
                    attempt,
                    retryable,
                    error = %e,
                    "Job failed, scheduling retry"
                );
                JobOutcome::Retried
            }
        };

        self.settle(delivery.as_ref(), &outcome).await;
        outcome
    }

    fn attempts_exhausted(&self, attempt: u32) -> bool {
        self.config.max_attempts.is_some_and(|max| attempt >= max)
    }

    async fn dead_letter(&self, job: &JobMessage, cause: &GatewayError) -> Result<()> {
        let outcome = self
            .store
            .merge_word_failure(&job.batch_id, &job.word.id, &cause.to_string())
            .await?;

        if !outcome.already_merged {
            warn!(
                batch_id = %job.batch_id,
                word_id = %job.word.id,
                error = %cause,
                "Word dead-lettered after exhausting attempts"
            );
        }
        Ok(())
    }

    async fn settle(&self, delivery: &dyn Delivery, outcome: &JobOutcome) {
        let job = delivery.job();
        let settled = match outcome {
            JobOutcome::Retried => delivery.retry(self.config.retry_delay).await,
            _ => delivery.ack().await,
        };

        // an unsettled delivery is redelivered by the transport; the merge key
        // keeps that harmless
        if let Err(e) = settled {
            error!(
                batch_id = %job.batch_id,
                word_id = %job.word.id,
                error = %e,
                "Failed to settle delivery"
            );
        }
    }

    /// Receive and process deliveries until `shutdown` flips to `true`
    pub async fn run(&self, receiver: Arc<dyn JobReceiver>, mut shutdown: watch::Receiver<bool>) {
        info!(
            concurrency = self.config.concurrency,
            batch_size = self.config.receive_batch_size,
            "Job consumer started"
        );

        while !*shutdown.borrow() {
            let received = tokio::select! {
                _ = shutdown.changed() => break,
                received = receiver.receive(self.config.receive_batch_size) => received,
            };

            match received {
                Ok(deliveries) if deliveries.is_empty() => {}
                Ok(deliveries) => {
                    let count = deliveries.len();
                    let mut jobs = Vec::with_capacity(count);
                    for delivery in deliveries {
                        jobs.push(self.handle(delivery));
                    }
                    stream::iter(jobs)
                        .buffer_unordered(self.config.concurrency)
                        .collect::<Vec<_>>()
                        .await;
                    debug!("Processed {} deliveries", count);
                }
                Err(e) => {
                    warn!(error = %e, "Receive failed, backing off");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }

        info!("Job consumer stopped");
    }

    /// Run the consumer loop on its own task
    pub fn spawn(
        self: Arc<Self>,
        receiver: Arc<dyn JobReceiver>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(receiver, shutdown).await })
    }
}
