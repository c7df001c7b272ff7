//! Core configuration validators
//!
//! This module provides validation implementations for the main gateway configuration
//! structures including GatewayConfig, ServerConfig, and ProviderConfig.

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.server.validate()?;

        // Check for duplicate provider names
        let mut provider_names = HashSet::new();
        for provider in &self.providers {
            if !provider_names.insert(&provider.name) {
                return Err(format!("Duplicate provider name: {}", provider.name));
            }
            provider.validate()?;
        }

        let fallbacks = self
            .providers
            .iter()
            .filter(|p| p.enabled && p.is_fallback())
            .count();
        if fallbacks > 1 {
            return Err("At most one enabled provider may omit its model list".to_string());
        }

        self.storage.validate()?;
        self.queue.validate()?;
        self.pipeline.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating server configuration");

        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            return Err("Max body size cannot be 0".to_string());
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }

        if self.name.contains('/') {
            return Err(format!(
                "Provider name '{}' cannot contain '/'",
                self.name
            ));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Provider '{}' base_url must be an http(s) URL",
                self.name
            ));
        }

        if self.timeout == 0 {
            return Err(format!("Provider '{}' timeout cannot be 0", self.name));
        }

        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(format!(
                "Provider '{}' lists an empty model name",
                self.name
            ));
        }

        Ok(())
    }
}
