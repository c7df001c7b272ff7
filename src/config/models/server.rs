//! HTTP listener settings

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how the HTTP surface listens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Actix worker threads; one per CPU when unset
    #[serde(default)]
    pub workers: Option<usize>,
    /// Seconds a client gets to send its request head
    #[serde(default = "default_request_timeout_secs", alias = "timeout")]
    pub request_timeout_secs: u64,
    /// Cap on request bodies, NDJSON batches included
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// Overlay every field of `other` that differs from its default
    pub fn merge(self, other: Self) -> Self {
        let defaults = Self::default();
        Self {
            host: if other.host != defaults.host { other.host } else { self.host },
            port: if other.port != defaults.port { other.port } else { self.port },
            workers: other.workers.or(self.workers),
            request_timeout_secs: if other.request_timeout_secs != defaults.request_timeout_secs {
                other.request_timeout_secs
            } else {
                self.request_timeout_secs
            },
            max_body_size: if other.max_body_size != defaults.max_body_size {
                other.max_body_size
            } else {
                self.max_body_size
            },
        }
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
