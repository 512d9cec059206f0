//! Contact export and the matching import parser.
//!
//! JSON exports are a pretty-printed array of full contacts. CSV exports use
//! one flat row per contact with tags joined by `;`. Both parse back into
//! [`ContactRecord`]s, so an export fed through [`parse_export`] and
//! [`PipelineStore::upsert_contact`] reproduces every non-timestamp field.

use crate::db::PipelineStore;
use crate::ingest::{DecodedRecord, IngestFailure};
use crate::validate::{TAG_SEPARATOR, clean_tags};
use crate::{OutreachError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use outreach_types::{Contact, ContactRecord, LeadSource, PipelineStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// MIME type for HTTP responses.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = OutreachError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(OutreachError::Validation(format!(
                "unsupported export format: '{}'",
                other
            ))),
        }
    }
}

/// Column order of CSV exports.
const CSV_HEADERS: [&str; 22] = [
    "email",
    "first_name",
    "last_name",
    "company_name",
    "position",
    "industry",
    "linkedin_url",
    "phone",
    "website",
    "company_size",
    "location",
    "notes",
    "tags",
    "status",
    "lead_score",
    "lead_source",
    "assigned_to",
    "estimated_value",
    "expected_close_date",
    "created_at",
    "updated_at",
    "last_contacted_at",
];

/// Flat CSV row. Field order must match [`CSV_HEADERS`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CsvRow {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    company_name: Option<String>,
    position: Option<String>,
    industry: Option<String>,
    linkedin_url: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    company_size: Option<String>,
    location: Option<String>,
    notes: Option<String>,
    tags: String,
    status: Option<PipelineStatus>,
    lead_score: Option<i64>,
    lead_source: Option<LeadSource>,
    assigned_to: Option<String>,
    estimated_value: Option<f64>,
    expected_close_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    last_contacted_at: Option<DateTime<Utc>>,
}

impl From<&Contact> for CsvRow {
    fn from(contact: &Contact) -> Self {
        Self {
            email: Some(contact.email.clone()),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            company_name: contact.company_name.clone(),
            position: contact.position.clone(),
            industry: contact.industry.clone(),
            linkedin_url: contact.linkedin_url.clone(),
            phone: contact.phone.clone(),
            website: contact.website.clone(),
            company_size: contact.company_size.clone(),
            location: contact.location.clone(),
            notes: contact.notes.clone(),
            tags: contact.tags.join(&TAG_SEPARATOR.to_string()),
            status: Some(contact.status),
            lead_score: Some(contact.lead_score),
            lead_source: Some(contact.lead_source),
            assigned_to: contact.assigned_to.clone(),
            estimated_value: contact.estimated_value,
            expected_close_date: contact.expected_close_date,
            created_at: Some(contact.created_at),
            updated_at: Some(contact.updated_at),
            last_contacted_at: contact.last_contacted_at,
        }
    }
}

impl From<CsvRow> for ContactRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            company_name: row.company_name,
            position: row.position,
            industry: row.industry,
            linkedin_url: row.linkedin_url,
            phone: row.phone,
            website: row.website,
            company_size: row.company_size,
            location: row.location,
            notes: row.notes,
            tags: clean_tags(vec![row.tags]),
            status: row.status,
            lead_score: row.lead_score,
            lead_source: row.lead_source,
            assigned_to: row.assigned_to,
            estimated_value: row.estimated_value,
            expected_close_date: row.expected_close_date,
        }
    }
}

impl PipelineStore {
    /// Serialize contacts, optionally restricted to one status.
    pub fn export_all(&self, format: ExportFormat, status: Option<PipelineStatus>) -> Result<String> {
        let contacts = self.list_contacts(status)?;
        let output = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&contacts)?,
            ExportFormat::Csv => contacts_to_csv(&contacts)?,
        };

        tracing::info!(
            target: "outreach::store",
            format = %format,
            count = contacts.len(),
            "Exported contacts"
        );
        Ok(output)
    }
}

fn contacts_to_csv(contacts: &[Contact]) -> Result<String> {
    // Header written by hand so an empty export still has one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for contact in contacts {
        writer.serialize(CsvRow::from(contact))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| OutreachError::Corrupt(e.to_string()))
}

/// Parse an export back into ingestion records.
///
/// A document that cannot be read at all is a validation error. Entries
/// that fail to decode come back as failures in their position, so a batch
/// ingest can report them and carry on. Unknown JSON fields and CSV columns
/// are ignored; missing ones are absent.
pub fn parse_export(format: ExportFormat, data: &str) -> Result<Vec<DecodedRecord>> {
    match format {
        ExportFormat::Json => {
            let values: Vec<serde_json::Value> = serde_json::from_str(data).map_err(|e| {
                OutreachError::Validation(format!("JSON import must be an array of records: {}", e))
            })?;
            Ok(decode_json_records(values))
        }
        ExportFormat::Csv => decode_csv(data),
    }
}

/// Decode JSON values into records independently of each other.
pub fn decode_json_records(values: Vec<serde_json::Value>) -> Vec<DecodedRecord> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            ContactRecord::deserialize(&value).map_err(|e| IngestFailure {
                index,
                email: value
                    .get("email")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                reason: format!("Invalid record: {}", e),
            })
        })
        .collect()
}

fn decode_csv(data: &str) -> Result<Vec<DecodedRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(data.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| OutreachError::Validation(format!("unreadable CSV header: {}", e)))?
        .clone();
    let email_column = headers.iter().position(|h| h == "email");

    let decoded = reader
        .records()
        .enumerate()
        .map(|(index, row)| {
            let row = row.map_err(|e| IngestFailure {
                index,
                email: None,
                reason: format!("Unreadable row: {}", e),
            })?;
            row.deserialize::<CsvRow>(Some(&headers))
                .map(ContactRecord::from)
                .map_err(|e| IngestFailure {
                    index,
                    email: email_column
                        .and_then(|i| row.get(i))
                        .map(str::trim)
                        .filter(|email| !email.is_empty())
                        .map(str::to_string),
                    reason: format!("Invalid record: {}", e),
                })
        })
        .collect();
    Ok(decoded)
}
