//! Main gateway configuration

#![allow(missing_docs)]

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Job queue configuration
    #[serde(default)]
    pub queue: QueueConfig,
    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl GatewayConfig {
    /// Merge two configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);

        // Merge providers (other takes precedence for same names)
        let mut order: Vec<String> = self.providers.iter().map(|p| p.name.clone()).collect();
        let mut provider_map: HashMap<String, ProviderConfig> = self
            .providers
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        for provider in other.providers {
            if !provider_map.contains_key(&provider.name) {
                order.push(provider.name.clone());
            }
            provider_map.insert(provider.name.clone(), provider);
        }

        self.providers = order
            .into_iter()
            .filter_map(|name| provider_map.remove(&name))
            .collect();
        self.storage = self.storage.merge(other.storage);
        self.queue = self.queue.merge(other.queue);
        self.pipeline = self.pipeline.merge(other.pipeline);

        self
    }
}
