//! Normalization and validation of incoming contact records.

use crate::{OutreachError, Result};
use once_cell::sync::Lazy;
use outreach_types::ContactRecord;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// Separator used when tags are flattened into a single text field.
pub(crate) const TAG_SEPARATOR: char = ';';

/// Trim and lower-case an email, rejecting missing or malformed addresses.
pub fn normalize_email(raw: Option<&str>) -> Result<String> {
    let email = raw.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(OutreachError::Validation("email is required".into()));
    }
    let email = email.to_lowercase();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(OutreachError::Validation(format!(
            "malformed email: '{}'",
            email
        )));
    }
    Ok(email)
}

/// Key used to look up an existing contact. Lookups never validate, so a
/// malformed address simply finds nothing.
pub(crate) fn lookup_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank strings carry no information; treat them as absent.
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Trim tags, split any that contain the separator, drop blanks and duplicates.
pub(crate) fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in &tags {
        for part in tag.split(TAG_SEPARATOR) {
            let part = part.trim();
            if !part.is_empty() && !cleaned.iter().any(|t| t == part) {
                cleaned.push(part.to_string());
            }
        }
    }
    cleaned
}

/// Validate a record and return it with every field normalized.
///
/// The returned record's `email` is always `Some` and normalized.
pub(crate) fn normalize_record(record: ContactRecord) -> Result<(String, ContactRecord)> {
    let email = normalize_email(record.email.as_deref())?;

    if let Some(value) = record.estimated_value {
        if !value.is_finite() || value < 0.0 {
            return Err(OutreachError::Validation(format!(
                "estimated_value must be a non-negative number, got {}",
                value
            )));
        }
    }

    let normalized = ContactRecord {
        email: Some(email.clone()),
        first_name: clean_text(record.first_name),
        last_name: clean_text(record.last_name),
        company_name: clean_text(record.company_name),
        position: clean_text(record.position),
        industry: clean_text(record.industry),
        linkedin_url: clean_text(record.linkedin_url),
        phone: clean_text(record.phone),
        website: clean_text(record.website),
        company_size: clean_text(record.company_size),
        location: clean_text(record.location),
        notes: clean_text(record.notes),
        tags: clean_tags(record.tags),
        status: record.status,
        lead_score: record.lead_score,
        lead_source: record.lead_source,
        assigned_to: clean_text(record.assigned_to),
        estimated_value: record.estimated_value,
        expected_close_date: record.expected_close_date,
    };
    Ok((email, normalized))
}
