//! OpenAI-compatible chat completions client

use super::{InvocationError, ModelInvoker};
use crate::config::ProviderConfig;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const POOL_MAX_IDLE_PER_HOST: usize = 32;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Invoker for one provider speaking the `/chat/completions` protocol
#[derive(Debug, Clone)]
pub struct OpenAICompatibleInvoker {
    name: String,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
    client: Client,
}

impl OpenAICompatibleInvoker {
    /// Build the invoker and its pooled HTTP client
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build()
            .map_err(|e| {
                GatewayError::Config(format!(
                    "Failed to create HTTP client for provider {}: {}",
                    config.name, e
                ))
            })?;

        Ok(Self {
            name: config.name.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout,
            client,
        })
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ModelInvoker for OpenAICompatibleInvoker {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, InvocationError> {
        debug!(provider = %self.name, model = %model, "Sending chat completion request");

        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InvocationError::timeout(model, self.timeout_secs)
            } else {
                InvocationError::http(model, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InvocationError::backend(model, status.as_u16(), message));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InvocationError::http(model, format!("invalid response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| InvocationError::empty_response(model))
    }
}
