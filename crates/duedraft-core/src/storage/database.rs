//! SQLite-based proposal and sync-state storage.
//!
//! Provides persistent storage for:
//! - Task proposals and their review status
//! - The sync baseline (last-seen project ids)

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use super::store::{ProposalStore, SyncStateStore};
use crate::error::{CoreError, DatabaseError, Result};
use crate::proposal::{
    DeadlineBasis, DeadlineSuggestion, DueDateSource, Proposal, ProposalDraft, ProposalPatch,
    ProposalStatus, TaskRef,
};
use crate::sync::SyncState;

/// Key of the singleton sync-state row.
pub const SYNC_STATE_KEY: &str = "notion_project_sync";

const PROPOSAL_COLUMNS: &str = "id, status, project_id, project_name, checklist_item_id,
    task_name, work_category, event_date, due_date, offset_days, final_due_text,
    suggestion_offset_days, task_page_id, task_page_url, created_at, updated_at, approved_at";

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Build a Proposal from a row selected with `PROPOSAL_COLUMNS`.
fn row_to_proposal(row: &Row) -> rusqlite::Result<Proposal> {
    let status_str: String = row.get(1)?;
    let status = status_str
        .parse::<ProposalStatus>()
        .map_err(|e| conversion_error(1, e))?;

    let suggestion: Option<i64> = row.get(11)?;
    let task_page_id: Option<String> = row.get(12)?;
    let task_page_url: Option<String> = row.get(13)?;

    let created_at: String = row.get(14)?;
    let updated_at: String = row.get(15)?;
    let approved_at: Option<String> = row.get(16)?;

    Ok(Proposal {
        id: row.get(0)?,
        status,
        draft: ProposalDraft {
            project_id: row.get(2)?,
            project_name: row.get(3)?,
            checklist_item_id: row.get(4)?,
            task_name: row.get(5)?,
            work_category: row.get(6)?,
            event_date: row.get(7)?,
            due_date: row.get(8)?,
            deadline_basis: DeadlineBasis::EventDate,
            offset_days: row.get(9)?,
            due_date_source: DueDateSource::RuleTable,
            final_due_text: row.get(10)?,
            advisory: suggestion.map(DeadlineSuggestion::from_event_date),
        },
        task: task_page_id.map(|id| TaskRef {
            id,
            url: task_page_url.unwrap_or_default(),
        }),
        created_at: parse_timestamp(14, &created_at)?,
        updated_at: parse_timestamp(15, &updated_at)?,
        approved_at: approved_at
            .as_deref()
            .map(|raw| parse_timestamp(16, raw))
            .transpose()?,
    })
}

/// SQLite database for proposals and the sync baseline.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/duedraft.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("duedraft.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn fetch(conn: &Connection, id: &str) -> rusqlite::Result<Option<Proposal>> {
        conn.query_row(
            &format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?1"),
            params![id],
            row_to_proposal,
        )
        .optional()
    }

    fn fetch_existing(conn: &Connection, id: &str) -> Result<Proposal> {
        Self::fetch(conn, id)?.ok_or_else(|| CoreError::ProposalNotFound(id.to_string()))
    }

    fn insert_drafts(
        conn: &Connection,
        drafts: &[ProposalDraft],
        now: DateTime<Utc>,
    ) -> rusqlite::Result<Vec<Proposal>> {
        let mut seq: i64 =
            conn.query_row("SELECT COALESCE(MAX(seq), 0) FROM proposals", [], |row| row.get(0))?;
        let mut stmt = conn.prepare(
            "INSERT INTO proposals (
                id, seq, status, project_id, project_name, checklist_item_id, task_name,
                work_category, event_date, due_date, deadline_basis, offset_days,
                due_date_source, final_due_text, suggestion_offset_days, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
        )?;

        let stamp = now.to_rfc3339();
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            seq += 1;
            let id = Uuid::new_v4().to_string();
            stmt.execute(params![
                id,
                seq,
                ProposalStatus::Pending.as_str(),
                draft.project_id,
                draft.project_name,
                draft.checklist_item_id,
                draft.task_name,
                draft.work_category,
                draft.event_date,
                draft.due_date,
                draft.deadline_basis.as_str(),
                draft.offset_days,
                draft.due_date_source.as_str(),
                draft.final_due_text,
                draft.advisory.map(|s| s.offset_days),
                stamp,
            ])?;
            created.push(Proposal {
                id,
                status: ProposalStatus::Pending,
                draft: draft.clone(),
                task: None,
                created_at: now,
                updated_at: now,
                approved_at: None,
            });
        }
        Ok(created)
    }

    fn write_baseline(
        conn: &Connection,
        project_ids: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<SyncState> {
        let encoded = serde_json::to_string(project_ids)?;
        conn.execute(
            "INSERT INTO sync_state (sync_id, project_ids, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(sync_id) DO UPDATE SET project_ids = excluded.project_ids,
                                                updated_at = excluded.updated_at",
            params![SYNC_STATE_KEY, encoded, now.to_rfc3339()],
        )?;
        Ok(SyncState {
            known_project_ids: project_ids.clone(),
            updated_at: now,
        })
    }

    /// Write the current draft fields of a proposal back to its row.
    fn write_draft_fields(
        conn: &Connection,
        id: &str,
        draft: &ProposalDraft,
        now: &str,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE proposals SET task_name = ?2, work_category = ?3, due_date = ?4, updated_at = ?5
             WHERE id = ?1",
            params![id, draft.task_name, draft.work_category, draft.due_date, now],
        )?;
        Ok(())
    }

    /// Every proposal regardless of status, oldest first.
    pub fn list_all(&self) -> Result<Vec<Proposal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PROPOSAL_COLUMNS} FROM proposals ORDER BY seq ASC"))?;
        let rows = stmt.query_map([], row_to_proposal)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Proposal counts per status.
    pub fn count_by_status(&self, status: ProposalStatus) -> Result<u64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM proposals WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?)
    }
}

impl SyncStateStore for Database {
    fn load_sync_state(&self) -> Result<Option<SyncState>> {
        Self::read_sync_state(&self.conn)
    }

    fn record_baseline(&self, project_ids: &BTreeSet<String>) -> Result<SyncState> {
        let tx = Self::begin_sync_write(&self.conn)?;
        let stored = Self::read_sync_state(&tx)?;
        let known = Self::next_baseline(&tx, stored.as_ref(), project_ids)?;
        let state = Self::write_baseline(&tx, &known, Utc::now())?;
        tx.commit()?;
        Ok(state)
    }

    fn commit_sync(
        &self,
        drafts: &[ProposalDraft],
        project_ids: &BTreeSet<String>,
    ) -> Result<Vec<Proposal>> {
        let now = Utc::now();
        let tx = Self::begin_sync_write(&self.conn)?;
        let stored = Self::read_sync_state(&tx)?;
        let fresh: Vec<ProposalDraft> = drafts
            .iter()
            .filter(|d| !stored.as_ref().is_some_and(|s| s.is_known(&d.project_id)))
            .cloned()
            .collect();
        if fresh.len() < drafts.len() {
            debug!(
                skipped = drafts.len() - fresh.len(),
                "drafts already covered by a concurrent sync"
            );
        }
        let created = Self::insert_drafts(&tx, &fresh, now)?;
        let known = Self::next_baseline(&tx, stored.as_ref(), project_ids)?;
        Self::write_baseline(&tx, &known, now)?;
        tx.commit()?;
        Ok(created)
    }
}

impl Database {
    /// Take the write lock up front so overlapping runs serialize on the baseline.
    fn begin_sync_write(conn: &Connection) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
    }

    /// `project_ids` plus every stored id that already has proposals.
    ///
    /// A run that listed projects before another run committed must not drop
    /// the ids that run just proposed for.
    fn next_baseline(
        conn: &Connection,
        stored: Option<&SyncState>,
        project_ids: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut known = project_ids.clone();
        let Some(stored) = stored else {
            return Ok(known);
        };
        let mut stmt = conn.prepare("SELECT DISTINCT project_id FROM proposals")?;
        let proposed = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for id in proposed {
            let id = id?;
            if stored.is_known(&id) {
                known.insert(id);
            }
        }
        Ok(known)
    }

    fn read_sync_state(conn: &Connection) -> Result<Option<SyncState>> {
        let row = conn
            .query_row(
                "SELECT project_ids, updated_at FROM sync_state WHERE sync_id = ?1",
                params![SYNC_STATE_KEY],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((ids_json, updated_at)) = row else {
            return Ok(None);
        };
        let known_project_ids: BTreeSet<String> = serde_json::from_str(&ids_json)?;
        let updated_at = parse_timestamp(1, &updated_at)?;
        Ok(Some(SyncState {
            known_project_ids,
            updated_at,
        }))
    }
}

impl ProposalStore for Database {
    fn create_many(&self, drafts: &[ProposalDraft]) -> Result<Vec<Proposal>> {
        let tx = self.conn.unchecked_transaction()?;
        let created = Self::insert_drafts(&tx, drafts, Utc::now())?;
        tx.commit()?;
        Ok(created)
    }

    fn get(&self, id: &str) -> Result<Option<Proposal>> {
        Ok(Self::fetch(&self.conn, id)?)
    }

    fn list_pending(&self) -> Result<Vec<Proposal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE status = ?1 ORDER BY seq ASC"
        ))?;
        let rows = stmt.query_map(params![ProposalStatus::Pending.as_str()], row_to_proposal)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn update(&self, id: &str, patch: &ProposalPatch) -> Result<Proposal> {
        patch.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut proposal = Self::fetch_existing(&tx, id)?;
        if !proposal.is_pending() {
            return Err(CoreError::NotEditable {
                id: id.to_string(),
                status: proposal.status,
            });
        }
        if patch.is_empty() {
            return Ok(proposal);
        }

        let now = Utc::now();
        patch.apply_to(&mut proposal.draft);
        Self::write_draft_fields(&tx, id, &proposal.draft, &now.to_rfc3339())?;
        tx.commit()?;
        proposal.updated_at = now;
        Ok(proposal)
    }

    fn mark_approved(&self, id: &str, overrides: &ProposalPatch, task: &TaskRef) -> Result<Proposal> {
        overrides.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut proposal = Self::fetch_existing(&tx, id)?;
        if !proposal.status.can_transition_to(ProposalStatus::Approved) {
            return Err(CoreError::InvalidTransition {
                id: id.to_string(),
                from: proposal.status,
                to: ProposalStatus::Approved,
            });
        }

        let now = Utc::now();
        let stamp = now.to_rfc3339();
        overrides.apply_to(&mut proposal.draft);
        Self::write_draft_fields(&tx, id, &proposal.draft, &stamp)?;
        tx.execute(
            "UPDATE proposals SET status = ?2, task_page_id = ?3, task_page_url = ?4,
                                  approved_at = ?5, updated_at = ?5
             WHERE id = ?1",
            params![id, ProposalStatus::Approved.as_str(), task.id, task.url, stamp],
        )?;
        tx.commit()?;

        proposal.status = ProposalStatus::Approved;
        proposal.task = Some(task.clone());
        proposal.updated_at = now;
        proposal.approved_at = Some(now);
        Ok(proposal)
    }

    fn mark_deleted(&self, id: &str) -> Result<Proposal> {
        let tx = self.conn.unchecked_transaction()?;
        let mut proposal = Self::fetch_existing(&tx, id)?;
        if !proposal.status.can_transition_to(ProposalStatus::Deleted) {
            return Err(CoreError::InvalidTransition {
                id: id.to_string(),
                from: proposal.status,
                to: ProposalStatus::Deleted,
            });
        }

        let now = Utc::now();
        tx.execute(
            "UPDATE proposals SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, ProposalStatus::Deleted.as_str(), now.to_rfc3339()],
        )?;
        tx.commit()?;

        proposal.status = ProposalStatus::Deleted;
        proposal.updated_at = now;
        Ok(proposal)
    }
}
