//! Batch submission and status endpoints

use crate::core::batch::parse_ndjson;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use tracing::debug;

/// `POST /v1/batches`
///
/// The body is newline-delimited JSON, one word per line. The batch is
/// persisted before emission starts, and emission runs in the background, so
/// the response always shows a fresh QUEUED snapshot.
pub async fn submit_batch(state: web::Data<AppState>, body: String) -> Result<HttpResponse> {
    let words = parse_ndjson(&body)?;
    debug!("Batch submission with {} word(s)", words.len());

    let batch = state.orchestrator.create(words.clone()).await?;
    state.orchestrator.spawn(batch.id.clone(), words);

    Ok(HttpResponse::Accepted().json(ApiResponse::success(batch)))
}

/// `GET /v1/batches/{batch_id}`
pub async fn get_batch(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let batch_id = path.into_inner();
    let batch = state
        .store
        .read_batch(&batch_id)
        .await?
        .ok_or_else(|| GatewayError::not_found(format!("Batch {} not found", batch_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(batch)))
}
