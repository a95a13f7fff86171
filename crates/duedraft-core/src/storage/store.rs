//! Persistence contracts used by the sync engine and the review service.
//!
//! [`Database`](super::Database) implements both traits on SQLite. Tests can
//! substitute their own implementations.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::proposal::{Proposal, ProposalDraft, ProposalPatch, TaskRef};
use crate::sync::SyncState;

/// Baseline of already-seen project ids.
pub trait SyncStateStore {
    /// `None` until the first sync run.
    fn load_sync_state(&self) -> Result<Option<SyncState>>;

    /// Replace the baseline with `project_ids` without writing proposals.
    /// Stored ids that already have proposals are kept.
    fn record_baseline(&self, project_ids: &BTreeSet<String>) -> Result<SyncState>;

    /// Insert `drafts` as pending proposals and replace the baseline with
    /// `project_ids` in one atomic unit. On error nothing is written.
    ///
    /// The baseline is re-read inside the write; drafts for projects it
    /// already holds are dropped, so only the inserted proposals are returned.
    fn commit_sync(
        &self,
        drafts: &[ProposalDraft],
        project_ids: &BTreeSet<String>,
    ) -> Result<Vec<Proposal>>;
}

/// Proposal records.
pub trait ProposalStore {
    /// Insert drafts as pending proposals.
    fn create_many(&self, drafts: &[ProposalDraft]) -> Result<Vec<Proposal>>;

    fn get(&self, id: &str) -> Result<Option<Proposal>>;

    /// Pending proposals, oldest first.
    fn list_pending(&self) -> Result<Vec<Proposal>>;

    /// Merge `patch` into a pending proposal. Fields not set in the patch keep
    /// their stored values.
    fn update(&self, id: &str, patch: &ProposalPatch) -> Result<Proposal>;

    /// `pending -> approved`, merging `overrides` and recording the created task.
    fn mark_approved(&self, id: &str, overrides: &ProposalPatch, task: &TaskRef) -> Result<Proposal>;

    /// `pending -> deleted`. The record is kept.
    fn mark_deleted(&self, id: &str) -> Result<Proposal>;
}
