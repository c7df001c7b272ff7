//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::batch::{BatchOrchestrator, FanOutConfig, ModelFanOut};
use crate::core::invoker::ModelInvoker;
use crate::storage::BatchStore;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Every field is cheap to clone; actix clones the state into each worker.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Batch persistence
    pub store: Arc<dyn BatchStore>,
    /// Model routing for synchronous chat
    pub invoker: Arc<dyn ModelInvoker>,
    /// Batch creation and job emission
    pub orchestrator: BatchOrchestrator,
    /// Fan-out used by the chat endpoint
    pub fanout: ModelFanOut,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn BatchStore>,
        invoker: Arc<dyn ModelInvoker>,
        orchestrator: BatchOrchestrator,
    ) -> Self {
        let fanout = ModelFanOut::new(FanOutConfig::from(config.pipeline()));
        Self {
            config,
            store,
            invoker,
            orchestrator,
            fanout,
        }
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
