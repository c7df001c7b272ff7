//! Batch pipeline tuning

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator and consumer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fixed delay before a failed job is redelivered
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Delivery attempts after which a word is recorded as failed.
    /// `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Jobs processed concurrently by one consumer
    #[serde(default = "default_consumer_concurrency")]
    pub consumer_concurrency: usize,
    /// Deliveries requested per receive call
    #[serde(default = "default_receive_batch_size")]
    pub receive_batch_size: usize,
    /// Back-off after an empty or failed receive
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per model call timeout
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,
    /// Model calls in flight per job
    #[serde(default = "default_model_concurrency")]
    pub model_concurrency: usize,
    /// Attempts per word enqueue step
    #[serde(default = "default_enqueue_max_attempts")]
    pub enqueue_max_attempts: u32,
    /// Pause between enqueue attempts
    #[serde(default = "default_enqueue_retry_delay_ms")]
    pub enqueue_retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay_secs(),
            max_attempts: None,
            consumer_concurrency: default_consumer_concurrency(),
            receive_batch_size: default_receive_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            model_timeout_secs: default_model_timeout_secs(),
            model_concurrency: default_model_concurrency(),
            enqueue_max_attempts: default_enqueue_max_attempts(),
            enqueue_retry_delay_ms: default_enqueue_retry_delay_ms(),
        }
    }
}

impl PipelineConfig {
    /// Merge pipeline configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.retry_delay_secs != default_retry_delay_secs() {
            self.retry_delay_secs = other.retry_delay_secs;
        }
        if other.max_attempts.is_some() {
            self.max_attempts = other.max_attempts;
        }
        if other.consumer_concurrency != default_consumer_concurrency() {
            self.consumer_concurrency = other.consumer_concurrency;
        }
        if other.receive_batch_size != default_receive_batch_size() {
            self.receive_batch_size = other.receive_batch_size;
        }
        if other.poll_interval_ms != default_poll_interval_ms() {
            self.poll_interval_ms = other.poll_interval_ms;
        }
        if other.model_timeout_secs != default_model_timeout_secs() {
            self.model_timeout_secs = other.model_timeout_secs;
        }
        if other.model_concurrency != default_model_concurrency() {
            self.model_concurrency = other.model_concurrency;
        }
        if other.enqueue_max_attempts != default_enqueue_max_attempts() {
            self.enqueue_max_attempts = other.enqueue_max_attempts;
        }
        if other.enqueue_retry_delay_ms != default_enqueue_retry_delay_ms() {
            self.enqueue_retry_delay_ms = other.enqueue_retry_delay_ms;
        }
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn enqueue_retry_delay(&self) -> Duration {
        Duration::from_millis(self.enqueue_retry_delay_ms)
    }
}
