//! Bulk ingestion.

use crate::db::PipelineStore;
use crate::export::{ExportFormat, parse_export};
use crate::{OutreachError, Result, UpsertOutcome};
use outreach_types::ContactRecord;
use serde::{Deserialize, Serialize};

/// Outcome of a batch ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.failures.len()
    }
}

/// A record the batch skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Position of the record in the batch.
    pub index: usize,
    /// Email as supplied, if any.
    pub email: Option<String>,
    pub reason: String,
}

/// An import entry: a decoded record, or the reason it could not be decoded.
pub type DecodedRecord = std::result::Result<ContactRecord, IngestFailure>;

impl PipelineStore {
    /// Upsert every record, skipping the ones that are rejected.
    ///
    /// Validation failures and illegal status changes are reported per
    /// record. Storage failures abort the batch; records before the failing
    /// one stay committed.
    pub fn ingest_batch(
        &self,
        records: impl IntoIterator<Item = ContactRecord>,
    ) -> Result<IngestReport> {
        self.ingest_decoded(records.into_iter().map(Ok))
    }

    /// Like [`PipelineStore::ingest_batch`], for entries that may already
    /// have failed to decode. Those are reported at their position.
    pub fn ingest_decoded(
        &self,
        entries: impl IntoIterator<Item = DecodedRecord>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (index, entry) in entries.into_iter().enumerate() {
            let record = match entry {
                Ok(record) => record,
                Err(failure) => {
                    tracing::debug!(
                        target: "outreach::store",
                        index,
                        reason = %failure.reason,
                        "Skipped undecodable record"
                    );
                    report.failures.push(failure);
                    continue;
                }
            };

            let email = record.email.clone();
            match self.upsert_contact(record) {
                Ok((_, UpsertOutcome::Inserted)) => report.inserted += 1,
                Ok((_, UpsertOutcome::Updated)) => report.updated += 1,
                Err(
                    e @ (OutreachError::Validation(_) | OutreachError::InvalidTransition { .. }),
                ) => {
                    tracing::debug!(
                        target: "outreach::store",
                        index,
                        email = ?email,
                        error = %e,
                        "Skipped record"
                    );
                    report.failures.push(IngestFailure {
                        index,
                        email,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            target: "outreach::store",
            inserted = report.inserted,
            updated = report.updated,
            failed = report.failures.len(),
            "Ingested batch"
        );
        Ok(report)
    }

    /// Parse an export and ingest its records.
    pub fn import_export(&self, format: ExportFormat, data: &str) -> Result<IngestReport> {
        let entries = parse_export(format, data)?;
        self.ingest_decoded(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_types::PipelineStatus;

    #[test]
    fn test_batch_continues_past_bad_records() {
        let store = PipelineStore::open_in_memory().unwrap();

        let mut update = ContactRecord::new("a@x.com");
        update.phone = Some("555-1".into());
        let report = store
            .ingest_batch(vec![
                ContactRecord::new("a@x.com"),
                ContactRecord::default(),
                ContactRecord::new("broken"),
                update,
                ContactRecord::new("b@x.com"),
            ])
            .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.processed(), 5);
        let failed: Vec<_> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(report.failures[1].email.as_deref(), Some("broken"));
        assert_eq!(store.list_contacts(None).unwrap().len(), 2);
    }

    #[test]
    fn test_illegal_status_in_batch_is_reported() {
        let store = PipelineStore::open_in_memory().unwrap();
        let mut won = ContactRecord::new("a@x.com");
        won.status = Some(PipelineStatus::ClosedWon);
        let mut regress = ContactRecord::new("a@x.com");
        regress.status = Some(PipelineStatus::New);

        let report = store.ingest_batch(vec![won, regress]).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("closed_won -> new"));
    }

    #[test]
    fn test_import_keeps_going_past_undecodable_rows() {
        let store = PipelineStore::open_in_memory().unwrap();
        let data = "email,status,lead_score\n\
                    good@x.com,new,5\n\
                    bad@x.com,won,high\n\
                    also@x.com,contacted,1\n";

        let report = store.import_export(ExportFormat::Csv, data).unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].email.as_deref(), Some("bad@x.com"));
        assert_eq!(store.list_contacts(None).unwrap().len(), 2);
        assert!(store.get_contact("bad@x.com").unwrap().is_none());
    }

    #[test]
    fn test_import_of_malformed_document_is_rejected() {
        let store = PipelineStore::open_in_memory().unwrap();
        let result = store.import_export(ExportFormat::Json, "[{\"email\": ");
        assert!(matches!(result, Err(OutreachError::Validation(_))));
    }

    #[test]
    fn test_import_export_between_stores() {
        let source = PipelineStore::open_in_memory().unwrap();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            source.upsert_contact(ContactRecord::new(email)).unwrap();
        }
        let exported = source.export_all(ExportFormat::Csv, None).unwrap();

        let target = PipelineStore::open_in_memory().unwrap();
        let report = target.import_export(ExportFormat::Csv, &exported).unwrap();
        assert_eq!(report.inserted, 3);
        assert!(report.failures.is_empty());

        // Re-importing only updates
        let report = target.import_export(ExportFormat::Csv, &exported).unwrap();
        assert_eq!(report.updated, 3);
    }
}
