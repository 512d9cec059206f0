//! HTTP route handlers.

pub mod campaigns;
pub mod contacts;
pub mod dashboard;
pub mod interactions;
pub mod tools;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post, put},
};
use outreach_core::OutreachError;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Handler error: status plus a plain-text message.
pub type ApiError = (StatusCode, String);

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Map a store or selector error onto an HTTP status.
pub fn error_response(err: OutreachError) -> ApiError {
    let status = match &err {
        OutreachError::Validation(_) | OutreachError::NoToolAvailable(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OutreachError::NotFound { .. } => StatusCode::NOT_FOUND,
        OutreachError::InvalidTransition { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(target: "outreach::api", error = %err, "Request failed");
    } else {
        tracing::debug!(target: "outreach::api", status = %status, error = %err, "Request rejected");
    }
    (status, err.to_string())
}

/// Reject an unparseable path or query value.
pub(crate) fn bad_value(err: impl std::fmt::Display) -> ApiError {
    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

/// Routes served under `/api`.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Contacts
        .route("/contacts", get(contacts::list).post(contacts::upsert))
        .route("/contacts/import", post(contacts::import))
        .route("/contacts/{email}", get(contacts::get))
        .route("/contacts/{email}/status", put(contacts::update_status))
        .route("/contacts/{email}/reopen", post(contacts::reopen))
        .route(
            "/contacts/{email}/interactions",
            get(interactions::list).post(interactions::log),
        )
        // Reporting
        .route("/dashboard", get(dashboard::summary))
        .route("/pipeline", get(dashboard::pipeline))
        .route("/export", get(dashboard::export))
        // Campaigns
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route("/campaigns/{id}", get(campaigns::get))
        .route("/campaigns/{id}/status", put(campaigns::update_status))
        // Lead collection
        .route("/tools/capabilities", get(tools::capabilities))
        .route("/tools/select", post(tools::select))
        .route("/health", get(health))
}

/// The full application: API routes plus CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
