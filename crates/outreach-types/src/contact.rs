//! Contact types and the pipeline state machine.

use crate::ParseEnumError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sales-funnel stage a contact occupies.
///
/// Variants are declared in forward pipeline order, which is also the
/// ordering used for dashboard buckets.
///
/// Deserialization goes through [`FromStr`], so "Closed Won" and
/// "closed-won" decode the same as "closed_won".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PipelineStatus {
    /// Freshly ingested, not yet contacted.
    #[default]
    New,
    /// First outreach sent.
    Contacted,
    /// Prospect replied.
    Responded,
    /// Prospect qualified as a real opportunity.
    Qualified,
    /// Proposal delivered.
    ProposalSent,
    /// Terms under discussion.
    Negotiation,
    /// Parked; no activity expected for now.
    Dormant,
    /// Deal won. Terminal.
    ClosedWon,
    /// Deal lost. Terminal.
    ClosedLost,
}

impl PipelineStatus {
    /// Every status, in pipeline order.
    pub const ALL: [PipelineStatus; 9] = [
        Self::New,
        Self::Contacted,
        Self::Responded,
        Self::Qualified,
        Self::ProposalSent,
        Self::Negotiation,
        Self::Dormant,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Responded => "responded",
            Self::Qualified => "qualified",
            Self::ProposalSent => "proposal_sent",
            Self::Negotiation => "negotiation",
            Self::Dormant => "dormant",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    /// Whether the deal is closed. Terminal statuses only move via reopen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }

    /// Transition table for ordinary status updates.
    ///
    /// Movement between open statuses is allowed in any direction so that
    /// mis-entered statuses can be corrected. Nothing leaves a closed status
    /// except through an explicit reopen.
    pub fn can_transition_to(self, next: PipelineStatus) -> bool {
        match (self, next) {
            (from, to) if from == to => true,
            (Self::ClosedWon | Self::ClosedLost, _) => false,
            _ => true,
        }
    }

    /// Transition table for the reopen operation: closed to open only.
    pub fn can_reopen_to(self, next: PipelineStatus) -> bool {
        self.is_terminal() && !next.is_terminal()
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("pipeline status", s))
    }
}

impl TryFrom<String> for PipelineStatus {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Acquisition channel that produced a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum LeadSource {
    Csv,
    Snov,
    Scrape,
    Search,
    #[default]
    Manual,
    SheetsImport,
}

impl LeadSource {
    pub const ALL: [LeadSource; 6] = [
        Self::Csv,
        Self::Snov,
        Self::Scrape,
        Self::Search,
        Self::Manual,
        Self::SheetsImport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Snov => "snov",
            Self::Scrape => "scrape",
            Self::Search => "search",
            Self::Manual => "manual",
            Self::SheetsImport => "sheets_import",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("lead source", s))
    }
}

impl TryFrom<String> for LeadSource {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A sales prospect as stored in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Normalized (trimmed, lower-case) email; the natural key.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Company size bucket, e.g. "11-50".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    pub status: PipelineStatus,
    pub lead_score: i64,
    pub lead_source: LeadSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Timestamp of the latest email or call logged against this contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Display name, falling back to the email when no name is known.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }

    /// The ingestion record that reproduces this contact's field values.
    pub fn to_record(&self) -> ContactRecord {
        ContactRecord {
            email: Some(self.email.clone()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            company_name: self.company_name.clone(),
            position: self.position.clone(),
            industry: self.industry.clone(),
            linkedin_url: self.linkedin_url.clone(),
            phone: self.phone.clone(),
            website: self.website.clone(),
            company_size: self.company_size.clone(),
            location: self.location.clone(),
            notes: self.notes.clone(),
            tags: self.tags.clone(),
            status: Some(self.status),
            lead_score: Some(self.lead_score),
            lead_source: Some(self.lead_source),
            assigned_to: self.assigned_to.clone(),
            estimated_value: self.estimated_value,
            expected_close_date: self.expected_close_date,
        }
    }
}

/// A raw lead as produced by an importer, scraper, or API caller.
///
/// Everything is optional at the type level; the store rejects records
/// whose email is missing or malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, alias = "company")]
    pub company_name: Option<String>,
    #[serde(default, alias = "title")]
    pub position: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default, alias = "linkedin")]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<PipelineStatus>,
    #[serde(default)]
    pub lead_score: Option<i64>,
    #[serde(default)]
    pub lead_source: Option<LeadSource>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
}

impl ContactRecord {
    /// Start a record for the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}
