//! HTTP route modules
//!
//! Successful responses are wrapped in [`ApiResponse`]; failures are rendered
//! by [`GatewayError`](crate::utils::error::GatewayError)'s `ResponseError`
//! impl.

pub mod batches;
pub mod chat;
pub mod health;

use actix_web::web;

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Configure the versioned API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/batches", web::post().to(batches::submit_batch))
            .route("/batches/{batch_id}", web::get().to(batches::get_batch))
            .route("/chat", web::post().to(chat::chat)),
    );
}
