//! Server builder and run_server function

use crate::config::Config;
use crate::core::{Gateway, Role};
use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Builder that turns a configuration into a running [`Gateway`]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    role: Role,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Select the components to run
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Connect every component
    pub async fn build(self) -> Result<Gateway> {
        let config = self
            .config
            .ok_or_else(|| GatewayError::Config("Configuration is required".to_string()))?;

        Gateway::new(config).await
    }

    /// Build and run until shutdown
    pub async fn run(self) -> Result<()> {
        let role = self.role;
        self.build().await?.run(role).await
    }
}

/// Load configuration from `config_path` and run the gateway.
///
/// A missing file falls back to defaults plus environment overrides; a file
/// that exists but does not parse is an error.
pub async fn run_server(config_path: &Path, role: Role) -> Result<()> {
    info!("Starting llm-batch-gateway");

    let config = if config_path.exists() {
        Config::from_file(config_path).await?
    } else {
        warn!(
            "Configuration file {:?} not found, using defaults and environment",
            config_path
        );
        Config::from_env()?
    };

    if role.runs_server() {
        info!(
            "Serving at http://{} (POST /v1/batches, GET /v1/batches/{{id}}, POST /v1/chat, GET /health)",
            config.server().bind_address()
        );
    }

    ServerBuilder::new()
        .with_config(config)
        .with_role(role)
        .run()
        .await
}
