//! Campaign route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use outreach_types::{Campaign, CampaignStatus, NewCampaign};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, error_response};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CampaignListResponse {
    pub campaigns: Vec<Campaign>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CampaignListResponse>, ApiError> {
    let campaigns = state.store.list_campaigns().map_err(error_response)?;
    Ok(Json(CampaignListResponse { campaigns }))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let campaign = state.store.create_campaign(request).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state
        .store
        .get_campaign(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("Campaign not found: {}", id)))
}

#[derive(Deserialize)]
pub struct CampaignStatusRequest {
    pub status: CampaignStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CampaignStatusRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state
        .store
        .update_campaign_status(id, request.status)
        .map_err(error_response)?;
    Ok(Json(campaign))
}
