//! Concurrent per-model fan-out for a single prompt

use super::types::ModelResult;
use crate::config::PipelineConfig;
use crate::core::invoker::{InvocationError, ModelInvoker};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use tracing::debug;

/// Configuration for a fan-out
#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Maximum concurrent model calls per prompt (default: 8)
    pub concurrency: usize,
    /// Timeout per individual model call (default: 60s)
    pub timeout: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(60),
        }
    }
}

impl FanOutConfig {
    /// Create a new config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set timeout per model call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&PipelineConfig> for FanOutConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self::new()
            .with_concurrency(config.model_concurrency)
            .with_timeout(config.model_timeout())
    }
}

/// Runs one prompt against several models, all or nothing
#[derive(Debug, Clone, Default)]
pub struct ModelFanOut {
    config: FanOutConfig,
}

impl ModelFanOut {
    pub fn new(config: FanOutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    /// Invoke every model concurrently.
    ///
    /// Results come back in `models` order. The first failure cancels the
    /// remaining calls and is returned; no partial results escape.
    pub async fn run(
        &self,
        invoker: &dyn ModelInvoker,
        prompt: &str,
        models: &[String],
    ) -> Result<Vec<ModelResult>, InvocationError> {
        let timeout = self.config.timeout;

        let mut calls = Vec::with_capacity(models.len());
        for (index, model) in models.iter().enumerate() {
            calls.push(async move {
                let output = tokio::time::timeout(timeout, invoker.invoke(model, prompt))
                    .await
                    .map_err(|_| InvocationError::timeout(model.as_str(), timeout.as_secs()))??;

                debug!(model = %model, "Model call succeeded");
                Ok::<_, InvocationError>((index, ModelResult::new(model.as_str(), output)))
            });
        }

        let mut results: Vec<(usize, ModelResult)> = stream::iter(calls)
            .buffer_unordered(self.config.concurrency)
            .try_collect()
            .await?;

        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }
}
