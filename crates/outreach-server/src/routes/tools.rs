//! Lead-collection tool route handlers.
//!
//! Tool availability comes from the server's configured integrations;
//! callers cannot claim credentials the server does not have.

use axum::{Json, extract::State};
use outreach_core::select_tool;
use outreach_types::{CollectionTool, Constraints, InputDescriptor, Selection, ToolCapability};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, error_response};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ToolStatus {
    #[serde(flatten)]
    pub capability: ToolCapability,
    pub available: bool,
    /// Unmet requirements; empty when available.
    pub missing: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    pub tools: Vec<ToolStatus>,
}

pub async fn capabilities(State(state): State<Arc<AppState>>) -> Json<CapabilitiesResponse> {
    let credentials = state.config.credentials();
    let tools = CollectionTool::ALL
        .into_iter()
        .map(|tool| {
            let missing = credentials.missing_for(tool);
            ToolStatus {
                capability: tool.capability(),
                available: missing.is_empty(),
                missing,
            }
        })
        .collect();
    Json(CapabilitiesResponse { tools })
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub input: InputDescriptor,
    #[serde(default)]
    pub constraints: Constraints,
}

pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<Selection>, ApiError> {
    let selection = select_tool(
        &request.input,
        request.constraints,
        state.config.credentials(),
    )
    .map_err(error_response)?;
    Ok(Json(selection))
}
