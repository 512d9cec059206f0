//! Contact route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use outreach_core::{ExportFormat, IngestReport, UpsertOutcome, decode_json_records};
use outreach_types::{Contact, ContactRecord, PipelineStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, bad_value, error_response};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct ContactListQuery {
    /// Free-text search over names, company, and email.
    pub q: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<Contact>,
    pub total_count: usize,
}

/// Search, filter, or list contacts.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PipelineStatus>)
        .transpose()
        .map_err(bad_value)?;

    let mut contacts = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => {
            let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            state
                .store
                .search_with_status(q, status, limit)
                .map_err(error_response)?
        }
        None => state.store.list_contacts(status).map_err(error_response)?,
    };
    if let Some(limit) = query.limit {
        contacts.truncate(limit);
    }

    Ok(Json(ContactListResponse {
        total_count: contacts.len(),
        contacts,
    }))
}

#[derive(Serialize)]
pub struct UpsertResponse {
    pub contact: Contact,
    pub outcome: UpsertOutcome,
}

/// Insert or merge one contact. 201 when created, 200 when merged.
pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Json(record): Json<ContactRecord>,
) -> Result<(StatusCode, Json<UpsertResponse>), ApiError> {
    let (contact, outcome) = state.store.upsert_contact(record).map_err(error_response)?;
    let status = match outcome {
        UpsertOutcome::Inserted => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(UpsertResponse { contact, outcome })))
}

/// Batch import body: a bare array of records, or the text of an export.
///
/// Array elements are decoded one at a time so a malformed element is
/// reported instead of rejecting the whole body.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ImportRequest {
    Records(Vec<serde_json::Value>),
    Export { format: ExportFormat, data: String },
}

pub async fn import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let report = match request {
        ImportRequest::Records(values) => state.store.ingest_decoded(decode_json_records(values)),
        ImportRequest::Export { format, data } => state.store.import_export(format, &data),
    }
    .map_err(error_response)?;

    tracing::info!(
        target: "outreach::api",
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failures.len(),
        "Imported contacts"
    );
    Ok(Json(report))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    state
        .store
        .get_contact(&email)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("Contact not found: {}", email)))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Contact>, ApiError> {
    let status: PipelineStatus = request.status.parse().map_err(bad_value)?;
    let contact = state
        .store
        .update_status(&email, status)
        .map_err(error_response)?;
    Ok(Json(contact))
}

/// Reopen a closed deal.
pub async fn reopen(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Contact>, ApiError> {
    let status: PipelineStatus = request.status.parse().map_err(bad_value)?;
    let contact = state.store.reopen(&email, status).map_err(error_response)?;
    Ok(Json(contact))
}
