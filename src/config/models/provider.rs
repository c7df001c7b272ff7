//! Provider configuration

use super::*;
use serde::{Deserialize, Serialize};

/// An OpenAI-compatible model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, also usable as a `name/model` prefix
    pub name: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// API key (sent as a bearer token when non-empty)
    #[serde(default)]
    pub api_key: String,
    /// Models served by this provider. An empty list makes it the fallback.
    #[serde(default)]
    pub models: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whether provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_url: String::new(),
            api_key: String::new(),
            models: Vec::new(),
            timeout: default_timeout(),
            enabled: true,
        }
    }
}

impl ProviderConfig {
    /// Whether this provider accepts any model not claimed elsewhere
    pub fn is_fallback(&self) -> bool {
        self.models.is_empty()
    }
}
