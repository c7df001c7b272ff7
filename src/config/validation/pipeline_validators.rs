//! Storage, queue and pipeline validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating storage configuration");

        if self.backend == StorageBackend::Database {
            self.database.validate()?;
        }

        Ok(())
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        let supported = ["sqlite:", "postgres://", "postgresql://"];
        if !supported.iter().any(|prefix| self.url.starts_with(prefix)) {
            return Err("Only SQLite and PostgreSQL databases are supported".to_string());
        }

        if self.max_connections == 0 {
            return Err("Database max connections must be greater than 0".to_string());
        }

        if self.max_connections > 1000 {
            return Err("Database max connections should not exceed 1000".to_string());
        }

        Ok(())
    }
}

impl Validate for QueueConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating queue configuration");

        if self.backend == QueueBackend::Redis {
            if !cfg!(feature = "redis") {
                return Err("Redis queue backend requires the 'redis' feature".to_string());
            }

            if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://")
            {
                return Err("Redis URL must start with redis:// or rediss://".to_string());
            }

            if self.stream.is_empty() || self.group.is_empty() {
                return Err("Queue stream and group names cannot be empty".to_string());
            }

            if self.claim_idle_ms == 0 {
                return Err("Queue claim idle time must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.consumer_concurrency == 0 {
            return Err("Consumer concurrency must be greater than 0".to_string());
        }

        if self.receive_batch_size == 0 {
            return Err("Receive batch size must be greater than 0".to_string());
        }

        if self.model_concurrency == 0 {
            return Err("Model concurrency must be greater than 0".to_string());
        }

        if self.model_timeout_secs == 0 {
            return Err("Model timeout cannot be 0".to_string());
        }

        if self.enqueue_max_attempts == 0 {
            return Err("Enqueue attempts must be at least 1".to_string());
        }

        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1 when set".to_string());
        }

        Ok(())
    }
}
