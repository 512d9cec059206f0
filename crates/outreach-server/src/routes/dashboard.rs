//! Reporting and export route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use outreach_core::{DashboardSummary, ExportFormat, PipelineStage};
use outreach_types::PipelineStatus;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, bad_value, error_response};
use crate::state::AppState;

pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = state.store.dashboard_summary().map_err(error_response)?;
    Ok(Json(summary))
}

/// Contacts grouped by pipeline stage.
pub async fn pipeline(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PipelineStage>>, ApiError> {
    let report = state.store.pipeline_report().map_err(error_response)?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    /// `json` (default) or `csv`.
    pub format: Option<String>,
    pub status: Option<String>,
}

/// Export contacts as a JSON or CSV document.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<ExportFormat>().map_err(error_response)?,
        None => ExportFormat::default(),
    };
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PipelineStatus>)
        .transpose()
        .map_err(bad_value)?;

    let body = state
        .store
        .export_all(format, status)
        .map_err(error_response)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}
