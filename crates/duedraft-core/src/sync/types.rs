//! Core types for incremental project synchronization.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proposal::{Proposal, ProposalDraft};

/// Baseline of project ids that have already been through the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub known_project_ids: BTreeSet<String>,
    /// Last time the baseline was written.
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    pub fn is_known(&self, project_id: &str) -> bool {
        self.known_project_ids.contains(project_id)
    }
}

/// What a sync run decided to write, before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// First run: remember every project and propose nothing.
    CreateBaseline { project_ids: BTreeSet<String> },
    /// No unseen projects: only refresh the baseline.
    RefreshBaseline { project_ids: BTreeSet<String> },
    /// Unseen projects found: write drafts and baseline atomically.
    Commit {
        new_project_ids: Vec<String>,
        drafts: Vec<ProposalDraft>,
        project_ids: BTreeSet<String>,
    },
}

/// Result of a completed sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    BaselineCreated {
        project_count: usize,
    },
    NoNewProjects {
        project_count: usize,
    },
    ProposalsCreated {
        project_count: usize,
        new_project_ids: Vec<String>,
        proposals: Vec<Proposal>,
    },
}

impl SyncOutcome {
    /// Proposals written by this run.
    pub fn proposals(&self) -> &[Proposal] {
        match self {
            Self::ProposalsCreated { proposals, .. } => proposals,
            _ => &[],
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::BaselineCreated { project_count } => format!(
                "Initial sync state created with {project_count} project(s); no proposals generated for the baseline."
            ),
            Self::NoNewProjects { project_count } => {
                format!("No new projects detected ({project_count} known).")
            }
            Self::ProposalsCreated {
                new_project_ids,
                proposals,
                ..
            } => format!(
                "Created {} proposal(s) for {} new project(s).",
                proposals.len(),
                new_project_ids.len()
            ),
        }
    }
}
