//! Health check endpoint

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, error};

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Liveness plus store reachability
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: Cow<'static, str>,
    pub store: Cow<'static, str>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: Cow<'static, str>,
}

/// `GET /health`
///
/// Answers `503` when the batch store cannot be reached.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    debug!("Health check requested");

    let store_ok = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Store health check failed");
            false
        }
    };

    let health = HealthStatus {
        status: Cow::Borrowed(if store_ok { "healthy" } else { "unhealthy" }),
        store: Cow::Borrowed(if store_ok { "ok" } else { "unavailable" }),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
    };

    if store_ok {
        HttpResponse::Ok().json(ApiResponse::success(health))
    } else {
        HttpResponse::ServiceUnavailable().json(ApiResponse::success(health))
    }
}
