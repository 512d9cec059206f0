//! Contact ingestion, status transitions, and contact queries.

use crate::db::{PipelineStore, insert_interaction, load_contact, row_to_contact, write_contact};
use crate::validate::{lookup_key, normalize_record};
use crate::{OutreachError, Result};
use chrono::{DateTime, Utc};
use outreach_types::{
    Contact, ContactRecord, Interaction, InteractionKind, Metadata, PipelineStatus,
};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an upsert created a new contact or merged into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl PipelineStore {
    /// Insert a contact, or merge the record into the existing one.
    ///
    /// Merge rule: a present, non-blank incoming value replaces the stored
    /// one; absent values keep what is stored. Tags are replaced only by a
    /// non-empty incoming list. A differing incoming status goes through the
    /// transition table and is logged like any other status change.
    pub fn upsert_contact(&self, record: ContactRecord) -> Result<(Contact, UpsertOutcome)> {
        let (email, record) = normalize_record(record)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let (contact, outcome) = match load_contact(&tx, &email)? {
            None => {
                let contact = new_contact(email, record, self.tick(None)?);
                write_contact(&tx, &contact)?;
                (contact, UpsertOutcome::Inserted)
            }
            Some(current) => {
                let previous_status = current.status;
                let requested_status = record.status;
                let mut contact = merge_record(current, record);
                contact.updated_at = self.tick(Some(contact.updated_at))?;

                if let Some(next) = requested_status.filter(|s| *s != previous_status) {
                    if !previous_status.can_transition_to(next) {
                        return Err(OutreachError::InvalidTransition {
                            from: previous_status,
                            to: next,
                        });
                    }
                    contact.status = next;
                    insert_interaction(
                        &tx,
                        &status_change_entry(&contact.email, previous_status, next, contact.updated_at, false),
                    )?;
                }

                write_contact(&tx, &contact)?;
                (contact, UpsertOutcome::Updated)
            }
        };

        tx.commit()?;
        tracing::debug!(
            target: "outreach::store",
            email = %contact.email,
            outcome = ?outcome,
            "Upserted contact"
        );
        Ok((contact, outcome))
    }

    /// Look up a contact by email.
    pub fn get_contact(&self, email: &str) -> Result<Option<Contact>> {
        let conn = self.conn()?;
        load_contact(&conn, &lookup_key(email))
    }

    /// Move a contact to `status` through the transition table.
    ///
    /// Setting the status a contact already has is a no-op.
    pub fn update_status(&self, email: &str, status: PipelineStatus) -> Result<Contact> {
        let key = lookup_key(email);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let contact = load_contact(&tx, &key)?.ok_or_else(|| OutreachError::contact_not_found(&key))?;
        if contact.status == status {
            return Ok(contact);
        }
        if !contact.status.can_transition_to(status) {
            return Err(OutreachError::InvalidTransition {
                from: contact.status,
                to: status,
            });
        }

        let at = self.tick(Some(contact.updated_at))?;
        let contact = apply_status(&tx, contact, status, at, false)?;
        tx.commit()?;
        Ok(contact)
    }

    /// Reopen a closed deal at a non-terminal status.
    pub fn reopen(&self, email: &str, status: PipelineStatus) -> Result<Contact> {
        let key = lookup_key(email);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let contact = load_contact(&tx, &key)?.ok_or_else(|| OutreachError::contact_not_found(&key))?;
        if !contact.status.can_reopen_to(status) {
            return Err(OutreachError::InvalidTransition {
                from: contact.status,
                to: status,
            });
        }

        let at = self.tick(Some(contact.updated_at))?;
        let contact = apply_status(&tx, contact, status, at, true)?;
        tx.commit()?;
        Ok(contact)
    }

    /// Case-insensitive substring search over names, company, and email.
    ///
    /// `%` and `_` in the query match literally. An empty query matches
    /// every contact.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Contact>> {
        self.search_with_status(query, None, limit)
    }

    /// [`PipelineStore::search`] restricted to one status. The status filter
    /// applies before the limit.
    pub fn search_with_status(
        &self,
        query: &str,
        status: Option<PipelineStatus>,
        limit: usize,
    ) -> Result<Vec<Contact>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM contacts
            WHERE (first_name LIKE ?1 ESCAPE '\'
                OR last_name LIKE ?1 ESCAPE '\'
                OR (COALESCE(first_name, '') || ' ' || COALESCE(last_name, '')) LIKE ?1 ESCAPE '\'
                OR company_name LIKE ?1 ESCAPE '\'
                OR email LIKE ?1 ESCAPE '\')
              AND (?3 IS NULL OR status = ?3)
            ORDER BY updated_at DESC, email ASC
            LIMIT ?2
            "#,
        )?;

        let contacts = stmt
            .query_map(
                params![pattern, limit as i64, status.map(PipelineStatus::as_str)],
                row_to_contact,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(contacts)
    }

    /// Contacts at exactly `status`, most recently updated first.
    pub fn filter_by_status(&self, status: PipelineStatus) -> Result<Vec<Contact>> {
        self.list_contacts(Some(status))
    }

    /// All contacts, optionally restricted to one status, most recently
    /// updated first.
    pub fn list_contacts(&self, status: Option<PipelineStatus>) -> Result<Vec<Contact>> {
        let conn = self.conn()?;
        if let Some(status) = status {
            let mut stmt = conn.prepare(
                "SELECT * FROM contacts WHERE status = ?1 ORDER BY updated_at DESC, email ASC",
            )?;
            let contacts = stmt
                .query_map(params![status.as_str()], row_to_contact)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(contacts)
        } else {
            let mut stmt =
                conn.prepare("SELECT * FROM contacts ORDER BY updated_at DESC, email ASC")?;
            let contacts = stmt
                .query_map([], row_to_contact)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(contacts)
        }
    }
}

fn new_contact(email: String, record: ContactRecord, now: DateTime<Utc>) -> Contact {
    Contact {
        email,
        first_name: record.first_name,
        last_name: record.last_name,
        company_name: record.company_name,
        position: record.position,
        industry: record.industry,
        linkedin_url: record.linkedin_url,
        phone: record.phone,
        website: record.website,
        company_size: record.company_size,
        location: record.location,
        notes: record.notes,
        tags: record.tags,
        status: record.status.unwrap_or_default(),
        lead_score: record.lead_score.unwrap_or(0),
        lead_source: record.lead_source.unwrap_or_default(),
        assigned_to: record.assigned_to,
        estimated_value: record.estimated_value,
        expected_close_date: record.expected_close_date,
        created_at: now,
        updated_at: now,
        last_contacted_at: None,
    }
}

/// Overlay the present fields of a normalized record. Status is left to the
/// caller.
fn merge_record(mut contact: Contact, record: ContactRecord) -> Contact {
    fn overlay<T>(slot: &mut Option<T>, incoming: Option<T>) {
        if incoming.is_some() {
            *slot = incoming;
        }
    }

    overlay(&mut contact.first_name, record.first_name);
    overlay(&mut contact.last_name, record.last_name);
    overlay(&mut contact.company_name, record.company_name);
    overlay(&mut contact.position, record.position);
    overlay(&mut contact.industry, record.industry);
    overlay(&mut contact.linkedin_url, record.linkedin_url);
    overlay(&mut contact.phone, record.phone);
    overlay(&mut contact.website, record.website);
    overlay(&mut contact.company_size, record.company_size);
    overlay(&mut contact.location, record.location);
    overlay(&mut contact.notes, record.notes);
    overlay(&mut contact.assigned_to, record.assigned_to);
    overlay(&mut contact.estimated_value, record.estimated_value);
    overlay(&mut contact.expected_close_date, record.expected_close_date);

    if !record.tags.is_empty() {
        contact.tags = record.tags;
    }
    if let Some(score) = record.lead_score {
        contact.lead_score = score;
    }
    if let Some(source) = record.lead_source {
        contact.lead_source = source;
    }
    contact
}

/// Write a status change and its log entry. The transition must already be
/// checked.
fn apply_status(
    conn: &Connection,
    mut contact: Contact,
    status: PipelineStatus,
    at: DateTime<Utc>,
    reopened: bool,
) -> Result<Contact> {
    let previous = contact.status;
    contact.status = status;
    contact.updated_at = at;

    write_contact(conn, &contact)?;
    insert_interaction(
        conn,
        &status_change_entry(&contact.email, previous, status, contact.updated_at, reopened),
    )?;

    tracing::info!(
        target: "outreach::store",
        email = %contact.email,
        from = %previous,
        to = %status,
        reopened,
        "Contact status changed"
    );
    Ok(contact)
}

fn status_change_entry(
    email: &str,
    from: PipelineStatus,
    to: PipelineStatus,
    at: DateTime<Utc>,
    reopened: bool,
) -> Interaction {
    let mut metadata = Metadata::new();
    metadata.insert("from".into(), from.as_str().into());
    metadata.insert("to".into(), to.as_str().into());
    if reopened {
        metadata.insert("reopened".into(), true.into());
    }

    Interaction {
        id: Uuid::new_v4(),
        contact_email: email.to_string(),
        kind: InteractionKind::StatusChange,
        timestamp: at,
        content: format!("Status changed from {} to {}", from, to),
        metadata,
    }
}

/// Escape LIKE wildcards so they match literally under `ESCAPE '\'`.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
