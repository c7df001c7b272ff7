//! Synchronous multi-model chat

use crate::core::batch::{ModelResult, Word};
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, warn};

/// Chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub models: Vec<String>,
}

/// `POST /v1/chat`
///
/// Runs the prompt against every model in parallel. Nothing is persisted, and
/// one failing model fails the request with `502`.
pub async fn chat(
    state: web::Data<AppState>,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let ChatRequest { prompt, models } = request.into_inner();
    let Word { prompt, models, .. } = Word::new("chat", prompt, models);
    if prompt.trim().is_empty() {
        return Err(GatewayError::invalid_request("prompt must not be empty"));
    }
    if models.is_empty() || models.iter().any(|m| m.trim().is_empty()) {
        return Err(GatewayError::invalid_request(
            "models must name at least one non-empty model",
        ));
    }

    debug!(models = models.len(), "Chat request");
    let results: Vec<ModelResult> = state
        .fanout
        .run(state.invoker.as_ref(), &prompt, &models)
        .await
        .map_err(|e| {
            warn!(model = %e.model(), error = %e, "Chat fan-out failed");
            GatewayError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(results)))
}
