//! Redis Streams transport
//!
//! Jobs live in a stream read through a consumer group. Retries are parked in
//! a sorted set scored by due time and moved back onto the stream by whichever
//! consumer polls after they fall due. Entries left pending on a consumer that
//! went away are claimed by the others once they have sat idle long enough.

use super::{Delivery, JobEnvelope, JobQueue, JobReceiver};
use crate::config::QueueConfig;
use crate::core::batch::JobMessage;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, Script, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

const PAYLOAD_FIELD: &str = "job";
const PROMOTE_LIMIT: usize = 256;

/// Pops due members off the delayed set and appends them to the stream in one
/// step, so a crash between the two cannot lose a retry.
///
/// KEYS[1] delayed set, KEYS[2] stream; ARGV[1] now in ms, ARGV[2] limit,
/// ARGV[3] payload field.
const PROMOTE_SCRIPT: &str = r"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, member in ipairs(due) do
    redis.call('ZREM', KEYS[1], member)
    redis.call('XADD', KEYS[2], '*', ARGV[3], member)
end
return #due
";

#[derive(Debug)]
struct StreamNames {
    stream: String,
    group: String,
    consumer: String,
    delayed: String,
}

/// Redis Streams job queue with a consumer group
#[derive(Debug, Clone)]
pub struct RedisStreamQueue {
    /// Enqueue, settlement and housekeeping commands
    conn: MultiplexedConnection,
    /// Group reads only; a blocking XREADGROUP would stall everything queued
    /// behind it on a shared connection
    reader: MultiplexedConnection,
    names: Arc<StreamNames>,
    block: Duration,
    claim_idle: Duration,
    promote: Arc<Script>,
    /// Whether this consumer's pending entries were reclaimed
    recovered: Arc<AtomicBool>,
    /// Millisecond timestamp of the last claim sweep
    last_claim: Arc<AtomicI64>,
}

impl RedisStreamQueue {
    /// Connect and make sure the consumer group exists
    pub async fn connect(config: &QueueConfig, block: Duration) -> Result<Self> {
        info!(stream = %config.stream, group = %config.group, "Connecting Redis job queue");

        let client = Client::open(config.redis_url.as_str()).map_err(GatewayError::Redis)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(GatewayError::Redis)?;
        let reader = client
            .get_multiplexed_async_connection()
            .await
            .map_err(GatewayError::Redis)?;

        let created: redis::RedisResult<String> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&config.stream)
            .arg(&config.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        match created {
            Ok(_) => debug!("Created consumer group {}", config.group),
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!("Consumer group {} already exists", config.group)
            }
            Err(e) => return Err(GatewayError::Redis(e)),
        }

        let consumer = config
            .consumer
            .clone()
            .unwrap_or_else(|| format!("consumer-{}", uuid::Uuid::new_v4().simple()));

        Ok(Self {
            conn,
            reader,
            names: Arc::new(StreamNames {
                stream: config.stream.clone(),
                group: config.group.clone(),
                consumer,
                delayed: config.delayed_key(),
            }),
            block,
            claim_idle: config.claim_idle(),
            promote: Arc::new(Script::new(PROMOTE_SCRIPT)),
            recovered: Arc::new(AtomicBool::new(false)),
            last_claim: Arc::new(AtomicI64::new(0)),
        })
    }

    /// Consumer name inside the group
    pub fn consumer(&self) -> &str {
        &self.names.consumer
    }

    async fn add(conn: &mut MultiplexedConnection, stream: &str, envelope: &JobEnvelope) -> Result<()> {
        let payload = serde_json::to_string(envelope)?;
        let _: String = conn.xadd(stream, "*", &[(PAYLOAD_FIELD, payload)]).await?;
        Ok(())
    }

    /// Move retries whose due time has passed back onto the stream
    async fn promote_due(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let now = chrono::Utc::now().timestamp_millis();

        let promoted: usize = self
            .promote
            .key(&self.names.delayed)
            .key(&self.names.stream)
            .arg(now)
            .arg(PROMOTE_LIMIT)
            .arg(PAYLOAD_FIELD)
            .invoke_async(&mut conn)
            .await?;

        if promoted > 0 {
            debug!(count = promoted, "Promoted due retries");
        }
        Ok(())
    }

    /// Take over entries another consumer has left pending past `claim_idle`.
    ///
    /// Runs at most once per `claim_idle` per queue handle.
    async fn claim_stale(&self, max: usize) -> Result<Vec<Box<dyn Delivery>>> {
        let now = chrono::Utc::now().timestamp_millis();
        let interval = i64::try_from(self.claim_idle.as_millis()).unwrap_or(i64::MAX);
        let last = self.last_claim.load(Ordering::SeqCst);
        if now.saturating_sub(last) < interval
            || self
                .last_claim
                .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let reply: Vec<Value> = redis::cmd("XAUTOCLAIM")
            .arg(&self.names.stream)
            .arg(&self.names.group)
            .arg(&self.names.consumer)
            .arg(self.claim_idle.as_millis() as u64)
            .arg("0-0")
            .arg("COUNT")
            .arg(max)
            .query_async(&mut conn)
            .await?;

        // [next-id, [[id, [field, value, ...]] | nil, ...], deleted-ids]
        let entries: Vec<Option<(String, Vec<String>)>> = match reply.get(1) {
            Some(value) => redis::from_redis_value(value)?,
            None => Vec::new(),
        };

        let mut deliveries = Vec::new();
        for (entry_id, fields) in entries.into_iter().flatten() {
            let payload = fields
                .chunks_exact(2)
                .find(|pair| pair[0] == PAYLOAD_FIELD)
                .map(|pair| pair[1].clone());
            if let Some(delivery) = self.deliver(entry_id, payload).await? {
                deliveries.push(delivery);
            }
        }

        if !deliveries.is_empty() {
            info!(count = deliveries.len(), "Claimed stale entries from other consumers");
        }
        Ok(deliveries)
    }

    async fn read(&self, start_id: &str, max: usize) -> Result<Vec<Box<dyn Delivery>>> {
        let mut reader = self.reader.clone();
        let mut options = StreamReadOptions::default()
            .group(&self.names.group, &self.names.consumer)
            .count(max);
        if start_id == ">" {
            options = options.block(self.block.as_millis() as usize);
        }

        let reply: Option<StreamReadReply> = reader
            .xread_options(&[&self.names.stream], &[start_id], &options)
            .await?;

        let mut deliveries: Vec<Box<dyn Delivery>> = Vec::new();
        for entry in reply.into_iter().flat_map(|r| r.keys).flat_map(|k| k.ids) {
            let payload = entry.get::<String>(PAYLOAD_FIELD);
            if let Some(delivery) = self.deliver(entry.id, payload).await? {
                deliveries.push(delivery);
            }
        }

        Ok(deliveries)
    }

    /// Wrap an entry as a delivery, or drop it from the stream if its payload
    /// does not decode
    async fn deliver(
        &self,
        entry_id: String,
        payload: Option<String>,
    ) -> Result<Option<Box<dyn Delivery>>> {
        let envelope =
            payload.and_then(|payload| serde_json::from_str::<JobEnvelope>(&payload).ok());

        let Some(envelope) = envelope else {
            warn!(entry_id = %entry_id, "Discarding malformed stream entry");
            let mut conn = self.conn.clone();
            let _: i64 = conn
                .xack(&self.names.stream, &self.names.group, &[&entry_id])
                .await?;
            let _: i64 = conn.xdel(&self.names.stream, &[&entry_id]).await?;
            return Ok(None);
        };

        Ok(Some(Box::new(RedisDelivery {
            envelope,
            entry_id,
            conn: self.conn.clone(),
            names: self.names.clone(),
            settled: AtomicBool::new(false),
        })))
    }
}

#[async_trait]
impl JobQueue for RedisStreamQueue {
    async fn enqueue(&self, job: JobMessage) -> Result<()> {
        debug!(batch_id = %job.batch_id, word_id = %job.word.id, "Enqueueing job to stream");
        let mut conn = self.conn.clone();
        Self::add(&mut conn, &self.names.stream, &JobEnvelope::first(job)).await
    }
}

#[async_trait]
impl JobReceiver for RedisStreamQueue {
    async fn receive(&self, max: usize) -> Result<Vec<Box<dyn Delivery>>> {
        let max = max.max(1);

        // entries delivered to this consumer before a restart come first
        if !self.recovered.load(Ordering::SeqCst) {
            let pending = self.read("0", max).await?;
            if !pending.is_empty() {
                info!(count = pending.len(), "Reclaimed pending stream entries");
                return Ok(pending);
            }
            self.recovered.store(true, Ordering::SeqCst);
        }

        let claimed = self.claim_stale(max).await?;
        if !claimed.is_empty() {
            return Ok(claimed);
        }

        self.promote_due().await?;
        self.read(">", max).await
    }
}

/// A stream entry handed out by [`RedisStreamQueue`]
#[derive(Debug)]
pub struct RedisDelivery {
    envelope: JobEnvelope,
    entry_id: String,
    conn: MultiplexedConnection,
    names: Arc<StreamNames>,
    settled: AtomicBool,
}

impl RedisDelivery {
    fn settle(&self) -> Result<()> {
        if self.settled.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::queue(format!(
                "stream entry {} already settled",
                self.entry_id
            )));
        }
        Ok(())
    }

    async fn remove(&self, conn: &mut MultiplexedConnection) -> Result<()> {
        let _: i64 = conn
            .xack(&self.names.stream, &self.names.group, &[&self.entry_id])
            .await?;
        let _: i64 = conn.xdel(&self.names.stream, &[&self.entry_id]).await?;
        Ok(())
    }
}

#[async_trait]
impl Delivery for RedisDelivery {
    fn job(&self) -> &JobMessage {
        &self.envelope.job
    }

    fn attempt(&self) -> u32 {
        self.envelope.attempt
    }

    async fn ack(&self) -> Result<()> {
        self.settle()?;
        let mut conn = self.conn.clone();
        self.remove(&mut conn).await
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        self.settle()?;
        let mut conn = self.conn.clone();

        let due = chrono::Utc::now().timestamp_millis() + delay.as_millis() as i64;
        let payload = serde_json::to_string(&self.envelope.next_attempt())?;
        let _: i64 = conn.zadd(&self.names.delayed, payload, due).await?;

        self.remove(&mut conn).await
    }
}
