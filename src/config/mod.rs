//! Configuration management for the Gateway
//!
//! This module handles loading, validation, and management of all gateway configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{GatewayError, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let gateway: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        let mut config = Self { gateway };
        config.apply_env_overrides()?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GATEWAY_*`-style environment overrides in place
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let gateway = &mut self.gateway;

        if let Ok(host) = env::var("GATEWAY_HOST") {
            gateway.server.host = host;
        }
        if let Ok(port) = env::var("GATEWAY_PORT") {
            gateway.server.port = port
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid port: {}", e)))?;
        }
        if let Ok(workers) = env::var("GATEWAY_WORKERS") {
            gateway.server.workers = Some(workers.parse().map_err(|e| {
                GatewayError::Config(format!("Invalid workers count: {}", e))
            })?);
        }
        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            gateway.storage.backend = backend.parse().map_err(GatewayError::Config)?;
        }
        if let Ok(db_url) = env::var("DATABASE_URL") {
            gateway.storage.database.url = db_url;
        }
        if let Ok(backend) = env::var("QUEUE_BACKEND") {
            gateway.queue.backend = backend.parse().map_err(GatewayError::Config)?;
        }
        if let Ok(redis_url) = env::var("REDIS_URL") {
            gateway.queue.redis_url = redis_url;
        }
        if let Ok(delay) = env::var("RETRY_DELAY_SECS") {
            gateway.pipeline.retry_delay_secs = delay
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid retry delay: {}", e)))?;
        }

        Ok(())
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get providers configuration
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.gateway.providers
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.gateway.storage
    }

    /// Get queue configuration
    pub fn queue(&self) -> &QueueConfig {
        &self.gateway.queue
    }

    /// Get pipeline configuration
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.gateway.pipeline
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.gateway
            .validate()
            .map_err(|e| GatewayError::Config(format!("Invalid configuration: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.gateway = self.gateway.merge(other.gateway);
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.gateway)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}
