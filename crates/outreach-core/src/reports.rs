//! Pipeline aggregates for dashboards.

use crate::db::PipelineStore;
use crate::{OutreachError, Result};
use outreach_types::{InteractionKind, PipelineStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Number of contacts. Always equals the sum of `by_status`.
    pub total: u64,
    /// Contact count per status; every status is present.
    pub by_status: BTreeMap<PipelineStatus, u64>,
    /// `closed_won / (closed_won + closed_lost)`, or 0 with no closed deals.
    pub conversion_rate: f64,
    pub interactions_logged: u64,
    pub emails_sent: u64,
}

/// One column of the pipeline board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub status: PipelineStatus,
    pub count: u64,
    /// Display names, most recently updated first.
    pub contacts: Vec<String>,
}

impl PipelineStore {
    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let conn = self.conn()?;

        let mut by_status: BTreeMap<PipelineStatus, u64> =
            PipelineStatus::ALL.into_iter().map(|s| (s, 0)).collect();

        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM contacts GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (status, count) in rows {
            let status: PipelineStatus = status
                .parse()
                .map_err(|e| OutreachError::Corrupt(format!("contacts.status: {}", e)))?;
            by_status.insert(status, count as u64);
        }

        let (interactions_logged, emails_sent): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(CASE WHEN kind = ?1 THEN 1 END) FROM interactions",
            [InteractionKind::EmailSent.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let won = by_status[&PipelineStatus::ClosedWon];
        let lost = by_status[&PipelineStatus::ClosedLost];
        let conversion_rate = if won + lost == 0 {
            0.0
        } else {
            won as f64 / (won + lost) as f64
        };

        Ok(DashboardSummary {
            total: by_status.values().sum(),
            by_status,
            conversion_rate,
            interactions_logged: interactions_logged as u64,
            emails_sent: emails_sent as u64,
        })
    }

    /// Contacts grouped by status, in pipeline order. Empty stages included.
    pub fn pipeline_report(&self) -> Result<Vec<PipelineStage>> {
        let contacts = self.list_contacts(None)?;
        let report = PipelineStatus::ALL
            .into_iter()
            .map(|status| {
                let names: Vec<String> = contacts
                    .iter()
                    .filter(|c| c.status == status)
                    .map(|c| c.display_name())
                    .collect();
                PipelineStage {
                    status,
                    count: names.len() as u64,
                    contacts: names,
                }
            })
            .collect();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_types::{ContactRecord, Metadata};
    use proptest::prelude::*;

    #[test]
    fn test_empty_store_has_every_bucket() {
        let store = PipelineStore::open_in_memory().unwrap();
        let summary = store.dashboard_summary().unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.by_status.len(), PipelineStatus::ALL.len());
        assert!(summary.by_status.values().all(|&n| n == 0));
        assert_eq!(summary.conversion_rate, 0.0);
    }

    #[test]
    fn test_conversion_rate_and_activity_totals() {
        let store = PipelineStore::open_in_memory().unwrap();
        for (email, status) in [
            ("a@x.com", PipelineStatus::ClosedWon),
            ("b@x.com", PipelineStatus::ClosedLost),
            ("c@x.com", PipelineStatus::ClosedLost),
            ("d@x.com", PipelineStatus::ClosedWon),
            ("e@x.com", PipelineStatus::Qualified),
        ] {
            store.upsert_contact(ContactRecord::new(email)).unwrap();
            store
                .log_interaction(email, InteractionKind::EmailSent, "Hi", Metadata::new())
                .unwrap();
            store.update_status(email, status).unwrap();
        }

        let summary = store.dashboard_summary().unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.by_status[&PipelineStatus::ClosedWon], 2);
        assert_eq!(summary.by_status[&PipelineStatus::New], 0);
        assert_eq!(summary.conversion_rate, 0.5);
        // One email and one status change per contact
        assert_eq!(summary.interactions_logged, 10);
        assert_eq!(summary.emails_sent, 5);
    }

    #[test]
    fn test_summary_serializes_status_keys() {
        let store = PipelineStore::open_in_memory().unwrap();
        store.upsert_contact(ContactRecord::new("a@x.com")).unwrap();

        let json = serde_json::to_value(store.dashboard_summary().unwrap()).unwrap();
        assert_eq!(json["by_status"]["new"], 1);
        assert_eq!(json["by_status"]["proposal_sent"], 0);
    }

    #[test]
    fn test_pipeline_report_groups_display_names() {
        let store = PipelineStore::open_in_memory().unwrap();
        let mut ada = ContactRecord::new("ada@x.com");
        ada.first_name = Some("Ada".into());
        store.upsert_contact(ada).unwrap();
        store.upsert_contact(ContactRecord::new("bob@x.com")).unwrap();
        store.update_status("bob@x.com", PipelineStatus::Qualified).unwrap();

        let report = store.pipeline_report().unwrap();
        assert_eq!(report.len(), PipelineStatus::ALL.len());
        assert_eq!(report[0].status, PipelineStatus::New);
        assert_eq!(report[0].contacts, vec!["Ada"]);
        let qualified = report
            .iter()
            .find(|s| s.status == PipelineStatus::Qualified)
            .unwrap();
        assert_eq!(qualified.contacts, vec!["bob@x.com"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_total_equals_bucket_sum(
            statuses in prop::collection::vec(0usize..PipelineStatus::ALL.len(), 0..12)
        ) {
            let store = PipelineStore::open_in_memory().unwrap();
            for (i, idx) in statuses.iter().enumerate() {
                let mut record = ContactRecord::new(format!("lead{}@x.com", i));
                record.status = Some(PipelineStatus::ALL[*idx]);
                store.upsert_contact(record).unwrap();
            }

            let summary = store.dashboard_summary().unwrap();
            prop_assert_eq!(summary.total, statuses.len() as u64);
            prop_assert_eq!(summary.total, summary.by_status.values().sum::<u64>());
            prop_assert!((0.0..=1.0).contains(&summary.conversion_rate));
        }
    }
}
