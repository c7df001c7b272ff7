//! In-process at-least-once queue

use super::{Delivery, JobEnvelope, JobQueue, JobReceiver};
use crate::core::batch::JobMessage;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct Shared {
    sender: mpsc::UnboundedSender<JobEnvelope>,
    /// Jobs enqueued and not yet acknowledged
    outstanding: AtomicUsize,
}

/// Unbounded tokio channel with delayed redelivery.
///
/// Unacknowledged jobs only survive as long as the process; use the Redis
/// transport when the queue has to outlive a restart.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    shared: Arc<Shared>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<JobEnvelope>>>,
    poll_interval: Duration,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Queue whose `receive` waits at most `poll_interval` for the first job
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                sender,
                outstanding: AtomicUsize::new(0),
            }),
            receiver: Arc::new(Mutex::new(receiver)),
            poll_interval,
        }
    }

    /// Jobs enqueued and not yet acknowledged, including scheduled retries
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    fn push(shared: &Shared, envelope: JobEnvelope) -> Result<()> {
        shared
            .sender
            .send(envelope)
            .map_err(|_| GatewayError::queue("memory queue is closed"))
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: JobMessage) -> Result<()> {
        debug!(batch_id = %job.batch_id, word_id = %job.word.id, "Enqueueing job");
        Self::push(&self.shared, JobEnvelope::first(job))?;
        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl JobReceiver for MemoryQueue {
    async fn receive(&self, max: usize) -> Result<Vec<Box<dyn Delivery>>> {
        let mut receiver = self.receiver.lock().await;
        let mut deliveries: Vec<Box<dyn Delivery>> = Vec::new();

        let first = match tokio::time::timeout(self.poll_interval, receiver.recv()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Err(GatewayError::queue("memory queue is closed")),
            Err(_) => return Ok(deliveries),
        };
        deliveries.push(Box::new(MemoryDelivery::new(first, self.shared.clone())));

        while deliveries.len() < max.max(1) {
            match receiver.try_recv() {
                Ok(envelope) => {
                    deliveries.push(Box::new(MemoryDelivery::new(envelope, self.shared.clone())))
                }
                Err(_) => break,
            }
        }

        Ok(deliveries)
    }
}

/// A job handed out by [`MemoryQueue`]
#[derive(Debug)]
pub struct MemoryDelivery {
    envelope: JobEnvelope,
    shared: Arc<Shared>,
    settled: AtomicBool,
}

impl MemoryDelivery {
    fn new(envelope: JobEnvelope, shared: Arc<Shared>) -> Self {
        Self {
            envelope,
            shared,
            settled: AtomicBool::new(false),
        }
    }

    fn settle(&self) -> Result<()> {
        if self.settled.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::queue(format!(
                "delivery {} already settled",
                self.envelope.job.merge_key()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Delivery for MemoryDelivery {
    fn job(&self) -> &JobMessage {
        &self.envelope.job
    }

    fn attempt(&self) -> u32 {
        self.envelope.attempt
    }

    async fn ack(&self) -> Result<()> {
        self.settle()?;
        self.shared.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        self.settle()?;

        let next = self.envelope.next_attempt();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if MemoryQueue::push(&shared, next).is_err() {
                tracing::warn!("Dropping retried job: memory queue is closed");
            }
        });

        Ok(())
    }
}
