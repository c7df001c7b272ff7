//! Model routing across configured providers

use super::{InvocationError, ModelInvoker, OpenAICompatibleInvoker};
use crate::config::ProviderConfig;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Route {
    name: String,
    models: Vec<String>,
    invoker: Arc<dyn ModelInvoker>,
}

/// Routes a model identifier to the provider that serves it.
///
/// Resolution order: a provider listing the model explicitly, then a
/// `provider/model` prefix, then the fallback provider (one with no model
/// list). Anything else is [`InvocationError::UnknownModel`].
#[derive(Debug, Clone, Default)]
pub struct InvokerRegistry {
    routes: Vec<Route>,
}

impl InvokerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP invokers for every enabled provider
    pub fn from_providers(providers: &[ProviderConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers.iter().filter(|p| p.enabled) {
            let invoker = OpenAICompatibleInvoker::new(provider)?;
            registry.register(&provider.name, provider.models.clone(), Arc::new(invoker));
        }
        info!("Model registry initialized with {} provider(s)", registry.len());
        Ok(registry)
    }

    /// Register an invoker under `name`; an empty `models` list makes it the fallback
    pub fn register(
        &mut self,
        name: impl Into<String>,
        models: Vec<String>,
        invoker: Arc<dyn ModelInvoker>,
    ) {
        self.routes.push(Route {
            name: name.into(),
            models,
            invoker,
        });
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `model` to a provider invoker and the model name it expects
    fn resolve<'a>(&self, model: &'a str) -> Option<(&Route, &'a str)> {
        if let Some(route) = self.routes.iter().find(|r| r.models.iter().any(|m| m == model)) {
            return Some((route, model));
        }

        if let Some((prefix, rest)) = model.split_once('/') {
            if let Some(route) = self.routes.iter().find(|r| r.name == prefix) {
                return Some((route, rest));
            }
        }

        self.routes
            .iter()
            .find(|r| r.models.is_empty())
            .map(|route| (route, model))
    }
}

#[async_trait]
impl ModelInvoker for InvokerRegistry {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, InvocationError> {
        let (route, upstream_model) = self
            .resolve(model)
            .ok_or_else(|| InvocationError::unknown_model(model))?;

        debug!(model = %model, provider = %route.name, "Routing model call");

        route
            .invoker
            .invoke(upstream_model, prompt)
            .await
            .map_err(|e| match e {
                // report the identifier the caller used
                InvocationError::Backend {
                    status, message, ..
                } => InvocationError::backend(model, status, message),
                InvocationError::Http { message, .. } => InvocationError::http(model, message),
                InvocationError::EmptyResponse { .. } => InvocationError::empty_response(model),
                InvocationError::Timeout { timeout_secs, .. } => {
                    InvocationError::timeout(model, timeout_secs)
                }
                InvocationError::UnknownModel(_) => InvocationError::unknown_model(model),
            })
    }
}
