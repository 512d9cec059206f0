//! Contact pipeline store and collection-tool selection for Outreach.

mod campaigns;
mod contacts;
mod db;
mod error;
mod export;
mod ingest;
mod interactions;
mod reports;
mod selector;
mod validate;

pub use contacts::UpsertOutcome;
pub use db::PipelineStore;
pub use error::OutreachError;
pub use export::{ExportFormat, decode_json_records, parse_export};
pub use ingest::{DecodedRecord, IngestFailure, IngestReport};
pub use reports::{DashboardSummary, PipelineStage};
pub use selector::select_tool;
pub use validate::normalize_email;

/// Result type for Outreach operations.
pub type Result<T> = std::result::Result<T, OutreachError>;
