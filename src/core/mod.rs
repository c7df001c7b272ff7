//! Core functionality for the Gateway
//!
//! This module contains the batch pipeline, model invocation and the job
//! queue transports, plus the [`Gateway`] that wires them together.

pub mod batch;
pub mod invoker;
pub mod queue;

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::server::state::AppState;
use crate::storage::BatchStore;
use crate::utils::error::{GatewayError, Result};
use batch::{BatchOrchestrator, ConsumerConfig, JobConsumer, OrchestratorConfig};
use invoker::{InvokerRegistry, ModelInvoker};
use queue::QueueHandles;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Which halves of the pipeline a process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Role {
    /// HTTP surface and orchestrator
    Server,
    /// Job consumer only
    Worker,
    /// Both in one process
    #[default]
    All,
}

impl Role {
    pub fn runs_server(self) -> bool {
        matches!(self, Role::Server | Role::All)
    }

    pub fn runs_consumer(self) -> bool {
        matches!(self, Role::Worker | Role::All)
    }
}

/// Main Gateway struct that owns every pipeline component
#[derive(Debug, Clone)]
pub struct Gateway {
    config: Arc<Config>,
    store: Arc<dyn BatchStore>,
    queues: QueueHandles,
    invoker: Arc<dyn ModelInvoker>,
    orchestrator: BatchOrchestrator,
    consumer: Arc<JobConsumer>,
}

impl Gateway {
    /// Connect storage and queue and register the configured providers
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing Gateway");

        debug!("Initializing batch store");
        let store = crate::storage::build_store(config.storage()).await?;

        debug!("Connecting job queue");
        let queues = queue::build_queue(config.queue(), config.pipeline().poll_interval()).await?;

        debug!("Registering model providers");
        let registry = InvokerRegistry::from_providers(config.providers())?;
        if registry.is_empty() {
            warn!("No providers configured; every model call will fail");
        }

        let gateway = Self::from_parts(config, store, queues, Arc::new(registry));
        info!("Gateway initialized successfully");
        Ok(gateway)
    }

    /// Assemble a gateway from already built components
    pub fn from_parts(
        config: Config,
        store: Arc<dyn BatchStore>,
        queues: QueueHandles,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        let pipeline = config.pipeline();
        let orchestrator = BatchOrchestrator::new(
            store.clone(),
            queues.queue.clone(),
            OrchestratorConfig::from(pipeline),
        );
        let consumer = Arc::new(JobConsumer::new(
            store.clone(),
            invoker.clone(),
            ConsumerConfig::from(pipeline),
        ));

        Self {
            config: Arc::new(config),
            store,
            queues,
            invoker,
            orchestrator,
            consumer,
        }
    }

    /// Run the components selected by `role` until shutdown.
    ///
    /// The HTTP server stops on its own signal handling; a worker-only
    /// process stops on Ctrl-C. The consumer is drained last either way.
    pub async fn run(self, role: Role) -> Result<()> {
        info!(?role, "Starting Gateway");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let consumer = role.runs_consumer().then(|| {
            self.consumer
                .clone()
                .spawn(self.queues.receiver.clone(), shutdown_rx)
        });

        let served = if role.runs_server() {
            self.resume_emissions();
            HttpServer::new(self.config.server().clone(), self.app_state())
                .start()
                .await
        } else {
            tokio::signal::ctrl_c().await.map_err(GatewayError::from)
        };

        info!("Shutting down Gateway");
        let _ = shutdown_tx.send(true);
        if let Some(handle) = consumer {
            if let Err(e) = handle.await {
                error!(error = %e, "Consumer task ended abnormally");
            }
        }

        served
    }

    /// Finish emission of batches a previous process left half-emitted
    fn resume_emissions(&self) {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.resume_pending().await {
                error!(error = %e, "Failed to scan for unfinished batch emissions");
            }
        });
    }

    /// Shared state for HTTP handlers
    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.config.clone(),
            self.store.clone(),
            self.invoker.clone(),
            self.orchestrator.clone(),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BatchStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn consumer(&self) -> &Arc<JobConsumer> {
        &self.consumer
    }

    pub fn queues(&self) -> &QueueHandles {
        &self.queues
    }
}
