//! Interaction history types.
//!
//! Interactions are append-only touchpoints logged against a contact:
//! generated emails, calls, meetings, notes, and status changes.

use crate::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Metadata key that links an interaction to a campaign.
pub const CAMPAIGN_ID_KEY: &str = "campaign_id";

/// Kind of touchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    EmailSent,
    EmailReceived,
    Call,
    Meeting,
    Note,
    FollowUp,
    Proposal,
    /// Logged implicitly by the store on every accepted status transition.
    StatusChange,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 8] = [
        Self::EmailSent,
        Self::EmailReceived,
        Self::Call,
        Self::Meeting,
        Self::Note,
        Self::FollowUp,
        Self::Proposal,
        Self::StatusChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailSent => "email_sent",
            Self::EmailReceived => "email_received",
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Note => "note",
            Self::FollowUp => "follow_up",
            Self::Proposal => "proposal",
            Self::StatusChange => "status_change",
        }
    }

    /// Whether logging this kind moves the contact's `last_contacted_at`.
    pub fn is_contact_touch(self) -> bool {
        matches!(self, Self::EmailSent | Self::EmailReceived | Self::Call)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        // "phone_call" is what older exports used for calls
        if normalized == "phone_call" {
            return Ok(Self::Call);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("interaction kind", s))
    }
}

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Open string-to-scalar mapping attached to an interaction.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One logged touchpoint against a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    /// Email of the owning contact.
    pub contact_email: String,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Interaction {
    /// Campaign this interaction was logged under, if any.
    pub fn campaign_id(&self) -> Option<&str> {
        self.metadata.get(CAMPAIGN_ID_KEY).and_then(|v| v.as_text())
    }
}
