//! Interaction logging.

use crate::db::{PipelineStore, insert_interaction, load_contact, row_to_interaction, write_contact};
use crate::validate::lookup_key;
use crate::{OutreachError, Result};
use outreach_types::{Interaction, InteractionKind, Metadata};
use rusqlite::params;
use uuid::Uuid;

impl PipelineStore {
    /// Append a touchpoint to a contact's history.
    ///
    /// The interaction shares its timestamp with the contact's new
    /// `updated_at`. Emails and calls also move `last_contacted_at`.
    /// Status changes cannot be logged directly; use
    /// [`PipelineStore::update_status`].
    pub fn log_interaction(
        &self,
        email: &str,
        kind: InteractionKind,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Interaction> {
        if kind == InteractionKind::StatusChange {
            return Err(OutreachError::Validation(
                "status_change interactions are recorded by status updates".into(),
            ));
        }

        let key = lookup_key(email);
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut contact =
            load_contact(&tx, &key)?.ok_or_else(|| OutreachError::contact_not_found(&key))?;
        let timestamp = self.tick(Some(contact.updated_at))?;

        let interaction = Interaction {
            id: Uuid::new_v4(),
            contact_email: contact.email.clone(),
            kind,
            timestamp,
            content: content.into(),
            metadata,
        };

        contact.updated_at = timestamp;
        if kind.is_contact_touch() {
            contact.last_contacted_at = Some(timestamp);
        }

        insert_interaction(&tx, &interaction)?;
        write_contact(&tx, &contact)?;
        tx.commit()?;

        tracing::debug!(
            target: "outreach::store",
            email = %interaction.contact_email,
            kind = %kind,
            campaign = ?interaction.campaign_id(),
            "Logged interaction"
        );
        Ok(interaction)
    }

    /// A contact's interaction history, newest first.
    pub fn list_interactions(&self, email: &str) -> Result<Vec<Interaction>> {
        let key = lookup_key(email);
        let conn = self.conn()?;
        if load_contact(&conn, &key)?.is_none() {
            return Err(OutreachError::contact_not_found(&key));
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM interactions
            WHERE contact_email = ?1
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )?;
        let interactions = stmt
            .query_map(params![key], row_to_interaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(interactions)
    }
}
