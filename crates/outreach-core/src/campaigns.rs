//! Campaign records and their derived counters.

use crate::db::{PipelineStore, format_date, format_ts, row_to_campaign};
use crate::{OutreachError, Result};
use chrono::Utc;
use outreach_types::{Campaign, CampaignStatus, InteractionKind, NewCampaign, PipelineStatus};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

impl PipelineStore {
    /// Create a campaign. The start date defaults to today (UTC).
    pub fn create_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(OutreachError::Validation("campaign name is required".into()));
        }

        let start_date = new.start_date.unwrap_or_else(|| Utc::now().date_naive());
        if let Some(end_date) = new.end_date {
            if end_date < start_date {
                return Err(OutreachError::Validation(format!(
                    "campaign ends ({}) before it starts ({})",
                    end_date, start_date
                )));
            }
        }

        let campaign = Campaign {
            id: Uuid::new_v4(),
            name,
            description: new
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            start_date,
            end_date: new.end_date,
            status: new.status,
            created_at: self.tick(None)?,
            emails_sent: 0,
            responses: 0,
            conversions: 0,
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO campaigns (id, name, description, status, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                campaign.id.to_string(),
                campaign.name,
                campaign.description,
                campaign.status.as_str(),
                format_date(&campaign.start_date),
                campaign.end_date.as_ref().map(format_date),
                format_ts(&campaign.created_at),
            ],
        )?;

        tracing::info!(
            target: "outreach::store",
            campaign_id = %campaign.id,
            name = %campaign.name,
            "Created campaign"
        );
        Ok(campaign)
    }

    /// Look up a campaign with its counters filled in.
    pub fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>> {
        let conn = self.conn()?;
        let campaign = conn
            .query_row(
                "SELECT * FROM campaigns WHERE id = ?1",
                params![id.to_string()],
                row_to_campaign,
            )
            .optional()?;

        match campaign {
            Some(campaign) => Ok(Some(with_counters(&conn, campaign)?)),
            None => Ok(None),
        }
    }

    /// All campaigns, latest start first.
    pub fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM campaigns ORDER BY start_date DESC, created_at DESC")?;
        let campaigns = stmt
            .query_map([], row_to_campaign)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        campaigns
            .into_iter()
            .map(|campaign| with_counters(&conn, campaign))
            .collect()
    }

    pub fn update_campaign_status(&self, id: Uuid, status: CampaignStatus) -> Result<Campaign> {
        {
            let conn = self.conn()?;
            let updated = conn.execute(
                "UPDATE campaigns SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.to_string()],
            )?;
            if updated == 0 {
                return Err(OutreachError::campaign_not_found(id));
            }
        }

        self.get_campaign(id)?
            .ok_or_else(|| OutreachError::campaign_not_found(id))
    }
}

/// Fill in counters from the interaction log.
fn with_counters(conn: &Connection, mut campaign: Campaign) -> Result<Campaign> {
    let (emails_sent, responses, conversions): (i64, i64, i64) = conn.query_row(
        r#"
        SELECT
            (SELECT COUNT(*) FROM interactions
                WHERE campaign_id = ?1 AND kind = ?2),
            (SELECT COUNT(*) FROM interactions
                WHERE campaign_id = ?1 AND kind = ?3),
            (SELECT COUNT(DISTINCT i.contact_email)
                FROM interactions i
                JOIN contacts c ON c.email = i.contact_email
                WHERE i.campaign_id = ?1 AND i.kind = ?2 AND c.status = ?4)
        "#,
        params![
            campaign.id.to_string(),
            InteractionKind::EmailSent.as_str(),
            InteractionKind::EmailReceived.as_str(),
            PipelineStatus::ClosedWon.as_str(),
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    campaign.emails_sent = emails_sent as u64;
    campaign.responses = responses as u64;
    campaign.conversions = conversions as u64;
    Ok(campaign)
}
