//! Error types for the Outreach core.

use outreach_types::PipelineStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutreachError {
    /// A record failed validation on ingestion. The record is skipped.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Status change rejected by the pipeline transition table.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: PipelineStatus,
        to: PipelineStatus,
    },

    /// No configured collection tool can handle the input.
    #[error("No tool available: {0}")]
    NoToolAvailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl OutreachError {
    pub(crate) fn contact_not_found(email: &str) -> Self {
        Self::NotFound {
            entity: "Contact",
            key: email.to_string(),
        }
    }

    pub(crate) fn campaign_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Campaign",
            key: id.to_string(),
        }
    }
}
