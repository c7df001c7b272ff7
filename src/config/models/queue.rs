//! Job queue configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which transport carries job messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// In-process channel; only valid when server and worker share a process
    #[default]
    Memory,
    /// Redis Streams with a consumer group
    Redis,
}

impl std::str::FromStr for QueueBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("Unknown queue backend: {}", other)),
        }
    }
}

/// Job queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue transport
    #[serde(default)]
    pub backend: QueueBackend,
    /// Redis URL (redis backend only)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Stream key; the delayed-retry set is stored under `<stream>:delayed`
    #[serde(default = "default_stream")]
    pub stream: String,
    /// Consumer group name
    #[serde(default = "default_group")]
    pub group: String,
    /// Consumer name within the group (defaults to a random id)
    #[serde(default)]
    pub consumer: Option<String>,
    /// Entries pending this long on another consumer are claimed by this one
    #[serde(default = "default_claim_idle_ms")]
    pub claim_idle_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            redis_url: default_redis_url(),
            stream: default_stream(),
            group: default_group(),
            consumer: None,
            claim_idle_ms: default_claim_idle_ms(),
        }
    }
}

impl QueueConfig {
    /// Merge queue configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.backend != QueueBackend::default() {
            self.backend = other.backend;
        }
        if other.redis_url != default_redis_url() {
            self.redis_url = other.redis_url;
        }
        if other.stream != default_stream() {
            self.stream = other.stream;
        }
        if other.group != default_group() {
            self.group = other.group;
        }
        if other.consumer.is_some() {
            self.consumer = other.consumer;
        }
        if other.claim_idle_ms != default_claim_idle_ms() {
            self.claim_idle_ms = other.claim_idle_ms;
        }
        self
    }

    /// Idle time after which another consumer's pending entry is claimed
    pub fn claim_idle(&self) -> Duration {
        Duration::from_millis(self.claim_idle_ms)
    }

    /// Key of the sorted set holding delayed retries
    pub fn delayed_key(&self) -> String {
        format!("{}:delayed", self.stream)
    }
}
