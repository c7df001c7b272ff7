//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod gateway;
pub mod pipeline;
pub mod provider;
pub mod queue;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use gateway::*;
pub use pipeline::*;
pub use provider::*;
pub use queue::*;
pub use server::*;
pub use storage::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default HTTP request head timeout in seconds
pub fn default_request_timeout_secs() -> u64 {
    30
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_database_url() -> String {
    "sqlite://data/gateway.db?mode=rwc".to_string()
}

pub fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

pub fn default_stream() -> String {
    "batch:jobs".to_string()
}

pub fn default_group() -> String {
    "batch-consumers".to_string()
}

pub fn default_claim_idle_ms() -> u64 {
    300_000
}

pub fn default_retry_delay_secs() -> u64 {
    5
}

pub fn default_consumer_concurrency() -> usize {
    16
}

pub fn default_receive_batch_size() -> usize {
    32
}

pub fn default_poll_interval_ms() -> u64 {
    250
}

pub fn default_model_timeout_secs() -> u64 {
    60
}

pub fn default_model_concurrency() -> usize {
    8
}

pub fn default_enqueue_max_attempts() -> u32 {
    3
}

pub fn default_enqueue_retry_delay_ms() -> u64 {
    200
}

pub fn default_true() -> bool {
    true
}
