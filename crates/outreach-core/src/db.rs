//! SQLite persistence for the contact pipeline.
//!
//! One database holds three tables: `contacts` (keyed by normalized email),
//! `interactions` (append-only, referencing contacts), and `campaigns`.
//! The store owns the only connection and is the sole writer; callers share
//! it through an `Arc`.

use crate::{OutreachError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use outreach_types::{Campaign, Contact, Interaction, Metadata};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Current schema version, recorded in the `schema_version` table.
const SCHEMA_VERSION: i64 = 2;

/// SQLite-based contact pipeline store.
pub struct PipelineStore {
    conn: Mutex<Connection>,
    /// Last timestamp handed out by [`PipelineStore::tick`].
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl PipelineStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::info!(target: "outreach::store", path = %path.display(), "Opened pipeline database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Mutex::new(conn),
            clock: Mutex::new(None),
        };
        store.init_schema()?;
        store.migrate()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| OutreachError::LockPoisoned)
    }

    /// Store-wide monotonic clock. Every call returns a timestamp later than
    /// any previous call and later than `floor`.
    pub(crate) fn tick(&self, floor: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
        let mut last = self.clock.lock().map_err(|_| OutreachError::LockPoisoned)?;
        let ts = next_timestamp((*last).max(floor));
        *last = Some(ts);
        Ok(ts)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                email TEXT PRIMARY KEY,
                first_name TEXT,
                last_name TEXT,
                company_name TEXT,
                position TEXT,
                industry TEXT,
                linkedin_url TEXT,
                phone TEXT,
                website TEXT,
                company_size TEXT,
                location TEXT,
                notes TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'new',
                lead_score INTEGER NOT NULL DEFAULT 0,
                lead_source TEXT NOT NULL DEFAULT 'manual',
                assigned_to TEXT,
                estimated_value REAL,
                expected_close_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_contacted_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(status);
            CREATE INDEX IF NOT EXISTS idx_contacts_updated_at ON contacts(updated_at);

            CREATE TABLE IF NOT EXISTS interactions (
                id TEXT PRIMARY KEY,
                contact_email TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                metadata TEXT NOT NULL DEFAULT '{}',
                FOREIGN KEY (contact_email) REFERENCES contacts(email) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_contact_email
                ON interactions(contact_email);
            CREATE INDEX IF NOT EXISTS idx_interactions_kind ON interactions(kind);

            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'planned',
                start_date TEXT NOT NULL,
                end_date TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Run migrations for schema updates.
    ///
    /// Runs in one transaction, so a failed backfill leaves the schema as it
    /// was and the next open retries it.
    fn migrate(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Campaign links used to live only inside the metadata JSON
        let has_campaign_id: bool = tx
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('interactions') WHERE name = 'campaign_id'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_campaign_id {
            tx.execute_batch(
                r#"
                ALTER TABLE interactions ADD COLUMN campaign_id TEXT;
                UPDATE interactions
                    SET campaign_id = json_extract(metadata, '$.campaign_id')
                    WHERE json_type(metadata, '$.campaign_id') = 'text';
                CREATE INDEX IF NOT EXISTS idx_interactions_campaign_id
                    ON interactions(campaign_id);
                "#,
            )?;
            tracing::info!(target: "outreach::store", "Added interactions.campaign_id column");
        }

        tx.execute(
            "INSERT INTO schema_version (id, version) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET version = excluded.version",
            params![SCHEMA_VERSION],
        )?;

        tx.commit()?;
        Ok(())
    }
}

// =========================================================================
// Timestamps
// =========================================================================

/// Timestamps are stored as fixed-width RFC 3339 strings so that text order
/// matches chronological order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Next store timestamp for a record last written at `previous`.
///
/// Always strictly later than `previous`, even when the wall clock has not
/// advanced past it (same microsecond, or a clock step backwards).
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(prev) if now <= prev => prev + chrono::Duration::microseconds(1),
        _ => now,
    }
}

fn conversion_error<E>(err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
}

fn parse_ts(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

fn parse_date(value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(conversion_error)
}

fn parse_enum<T>(value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(conversion_error)
}

// =========================================================================
// Contact rows
// =========================================================================

pub(crate) fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    let tags: String = row.get("tags")?;
    let status: String = row.get("status")?;
    let lead_source: String = row.get("lead_source")?;
    let expected_close_date: Option<String> = row.get("expected_close_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let last_contacted_at: Option<String> = row.get("last_contacted_at")?;

    Ok(Contact {
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        company_name: row.get("company_name")?,
        position: row.get("position")?,
        industry: row.get("industry")?,
        linkedin_url: row.get("linkedin_url")?,
        phone: row.get("phone")?,
        website: row.get("website")?,
        company_size: row.get("company_size")?,
        location: row.get("location")?,
        notes: row.get("notes")?,
        tags: serde_json::from_str(&tags).map_err(conversion_error)?,
        status: parse_enum(&status)?,
        lead_score: row.get("lead_score")?,
        lead_source: parse_enum(&lead_source)?,
        assigned_to: row.get("assigned_to")?,
        estimated_value: row.get("estimated_value")?,
        expected_close_date: expected_close_date.as_deref().map(parse_date).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        last_contacted_at: last_contacted_at.as_deref().map(parse_ts).transpose()?,
    })
}

pub(crate) fn load_contact(conn: &Connection, email: &str) -> Result<Option<Contact>> {
    let contact = conn
        .query_row(
            "SELECT * FROM contacts WHERE email = ?1",
            params![email],
            row_to_contact,
        )
        .optional()?;
    Ok(contact)
}

/// Insert the contact, or overwrite every column of the existing row.
///
/// Uses an upsert rather than `INSERT OR REPLACE`, which would delete the
/// row and cascade to its interactions.
pub(crate) fn write_contact(conn: &Connection, contact: &Contact) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO contacts (
            email, first_name, last_name, company_name, position, industry,
            linkedin_url, phone, website, company_size, location, notes, tags,
            status, lead_score, lead_source, assigned_to, estimated_value,
            expected_close_date, created_at, updated_at, last_contacted_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
        )
        ON CONFLICT(email) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            company_name = excluded.company_name,
            position = excluded.position,
            industry = excluded.industry,
            linkedin_url = excluded.linkedin_url,
            phone = excluded.phone,
            website = excluded.website,
            company_size = excluded.company_size,
            location = excluded.location,
            notes = excluded.notes,
            tags = excluded.tags,
            status = excluded.status,
            lead_score = excluded.lead_score,
            lead_source = excluded.lead_source,
            assigned_to = excluded.assigned_to,
            estimated_value = excluded.estimated_value,
            expected_close_date = excluded.expected_close_date,
            updated_at = excluded.updated_at,
            last_contacted_at = excluded.last_contacted_at
        "#,
        params![
            contact.email,
            contact.first_name,
            contact.last_name,
            contact.company_name,
            contact.position,
            contact.industry,
            contact.linkedin_url,
            contact.phone,
            contact.website,
            contact.company_size,
            contact.location,
            contact.notes,
            serde_json::to_string(&contact.tags)?,
            contact.status.as_str(),
            contact.lead_score,
            contact.lead_source.as_str(),
            contact.assigned_to,
            contact.estimated_value,
            contact.expected_close_date.as_ref().map(format_date),
            format_ts(&contact.created_at),
            format_ts(&contact.updated_at),
            contact.last_contacted_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(())
}

// =========================================================================
// Interaction rows
// =========================================================================

pub(crate) fn row_to_interaction(row: &rusqlite::Row) -> rusqlite::Result<Interaction> {
    let id: String = row.get("id")?;
    let kind: String = row.get("kind")?;
    let timestamp: String = row.get("timestamp")?;
    let metadata: String = row.get("metadata")?;

    Ok(Interaction {
        id: Uuid::parse_str(&id).map_err(conversion_error)?,
        contact_email: row.get("contact_email")?,
        kind: parse_enum(&kind)?,
        timestamp: parse_ts(&timestamp)?,
        content: row.get("content")?,
        metadata: serde_json::from_str::<Metadata>(&metadata).map_err(conversion_error)?,
    })
}

pub(crate) fn insert_interaction(conn: &Connection, interaction: &Interaction) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO interactions (
            id, contact_email, kind, timestamp, content, metadata, campaign_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            interaction.id.to_string(),
            interaction.contact_email,
            interaction.kind.as_str(),
            format_ts(&interaction.timestamp),
            interaction.content,
            serde_json::to_string(&interaction.metadata)?,
            interaction.campaign_id(),
        ],
    )?;
    Ok(())
}

// =========================================================================
// Campaign rows
// =========================================================================

/// Campaign columns only; counters are filled in by the caller.
pub(crate) fn row_to_campaign(row: &rusqlite::Row) -> rusqlite::Result<Campaign> {
    let id: String = row.get("id")?;
    let status: String = row.get("status")?;
    let start_date: String = row.get("start_date")?;
    let end_date: Option<String> = row.get("end_date")?;
    let created_at: String = row.get("created_at")?;

    Ok(Campaign {
        id: Uuid::parse_str(&id).map_err(conversion_error)?,
        name: row.get("name")?,
        description: row.get("description")?,
        start_date: parse_date(&start_date)?,
        end_date: end_date.as_deref().map(parse_date).transpose()?,
        status: parse_enum(&status)?,
        created_at: parse_ts(&created_at)?,
        emails_sent: 0,
        responses: 0,
        conversions: 0,
    })
}
