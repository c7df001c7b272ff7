//! Job queue transports
//!
//! The pipeline talks to the queue through two seams: [`JobQueue`] on the
//! producer side and [`JobReceiver`] on the consumer side. Deliveries are
//! at-least-once; a [`Delivery`] is settled exactly once by either
//! [`Delivery::ack`] or [`Delivery::retry`].

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::{MemoryDelivery, MemoryQueue};
#[cfg(feature = "redis")]
pub use self::redis::{RedisDelivery, RedisStreamQueue};

use crate::config::{QueueBackend, QueueConfig};
use crate::core::batch::JobMessage;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Wire envelope carrying a job and its 1-based delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobEnvelope {
    pub job: JobMessage,
    pub attempt: u32,
}

impl JobEnvelope {
    /// First delivery of `job`
    pub fn first(job: JobMessage) -> Self {
        Self { job, attempt: 1 }
    }

    /// Envelope for the next delivery after a retry
    pub fn next_attempt(&self) -> Self {
        Self {
            job: self.job.clone(),
            attempt: self.attempt.saturating_add(1),
        }
    }
}

/// Producer side of the queue
#[async_trait]
pub trait JobQueue: Send + Sync + std::fmt::Debug {
    /// Make `job` available for delivery
    async fn enqueue(&self, job: JobMessage) -> Result<()>;
}

/// Consumer side of the queue
#[async_trait]
pub trait JobReceiver: Send + Sync + std::fmt::Debug {
    /// Wait briefly for deliveries and return at most `max` of them.
    ///
    /// An empty vector means nothing was ready.
    async fn receive(&self, max: usize) -> Result<Vec<Box<dyn Delivery>>>;
}

/// One delivered job awaiting settlement
#[async_trait]
pub trait Delivery: Send + Sync + std::fmt::Debug {
    /// The delivered job
    fn job(&self) -> &JobMessage;

    /// 1-based delivery attempt
    fn attempt(&self) -> u32;

    /// Remove the job from the queue
    async fn ack(&self) -> Result<()>;

    /// Redeliver the job after `delay` with its attempt counter bumped
    async fn retry(&self, delay: Duration) -> Result<()>;
}

/// Producer and consumer handles for the configured transport
#[derive(Debug, Clone)]
pub struct QueueHandles {
    pub queue: Arc<dyn JobQueue>,
    pub receiver: Arc<dyn JobReceiver>,
}

/// Connect the transport selected by `queue.backend`
pub async fn build_queue(config: &QueueConfig, poll_interval: Duration) -> Result<QueueHandles> {
    match config.backend {
        QueueBackend::Memory => {
            let queue = Arc::new(MemoryQueue::with_poll_interval(poll_interval));
            Ok(QueueHandles {
                queue: queue.clone(),
                receiver: queue,
            })
        }
        #[cfg(feature = "redis")]
        QueueBackend::Redis => {
            let queue = Arc::new(RedisStreamQueue::connect(config, poll_interval).await?);
            Ok(QueueHandles {
                queue: queue.clone(),
                receiver: queue,
            })
        }
        #[cfg(not(feature = "redis"))]
        QueueBackend::Redis => Err(crate::utils::error::GatewayError::Config(
            "Redis queue backend requires the 'redis' feature".to_string(),
        )),
    }
}
