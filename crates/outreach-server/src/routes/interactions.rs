//! Interaction history route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use outreach_types::{Interaction, InteractionKind, Metadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, bad_value, error_response};
use crate::state::AppState;

#[derive(Serialize)]
pub struct InteractionListResponse {
    pub interactions: Vec<Interaction>,
    pub total_count: usize,
}

/// A contact's history, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<InteractionListResponse>, ApiError> {
    let interactions = state
        .store
        .list_interactions(&email)
        .map_err(error_response)?;
    Ok(Json(InteractionListResponse {
        total_count: interactions.len(),
        interactions,
    }))
}

#[derive(Deserialize)]
pub struct LogInteractionRequest {
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

pub async fn log(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(request): Json<LogInteractionRequest>,
) -> Result<(StatusCode, Json<Interaction>), ApiError> {
    let kind: InteractionKind = request.kind.parse().map_err(bad_value)?;
    let interaction = state
        .store
        .log_interaction(&email, kind, request.content, request.metadata)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(interaction)))
}
