//! Proposal records and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deadline::{add_offset, is_valid_due_date};
use crate::error::ValidationError;

/// Review status of a proposal.
///
/// `Pending` moves to `Approved` or `Deleted`; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Deleted,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Deleted => "deleted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Deleted)
        )
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "deleted" => Ok(Self::Deleted),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("unknown proposal status '{other}'"),
            }),
        }
    }
}

/// What a deadline offset is measured from. Only the event date exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBasis {
    #[default]
    EventDate,
}

impl DeadlineBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventDate => "event_date",
        }
    }
}

/// Which strategy produced the authoritative due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDateSource {
    #[default]
    RuleTable,
}

impl DueDateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleTable => "rule_table",
        }
    }
}

/// Parser-derived offset shown to reviewers next to the authoritative due date.
/// It is never applied automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineSuggestion {
    pub deadline_basis: DeadlineBasis,
    pub offset_days: i64,
}

impl DeadlineSuggestion {
    pub fn from_event_date(offset_days: i64) -> Self {
        Self {
            deadline_basis: DeadlineBasis::EventDate,
            offset_days,
        }
    }
}

/// Everything the synthesizer decides about one (project, checklist item) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub project_id: String,
    pub project_name: String,
    pub checklist_item_id: String,
    pub task_name: String,
    pub work_category: String,
    /// Event date the offsets are relative to, kept for reviewer context.
    pub event_date: Option<String>,
    pub due_date: Option<String>,
    pub deadline_basis: DeadlineBasis,
    pub offset_days: i64,
    pub due_date_source: DueDateSource,
    pub final_due_text: String,
    pub advisory: Option<DeadlineSuggestion>,
}

impl ProposalDraft {
    /// Due date the advisory offset would produce, for display only.
    pub fn advisory_due_date(&self) -> Option<String> {
        let suggestion = self.advisory?;
        add_offset(self.event_date.as_deref(), suggestion.offset_days)
    }

    /// True when the parser recognized the due text and disagrees with the
    /// rule table.
    pub fn advisory_disagrees(&self) -> bool {
        self.advisory
            .is_some_and(|s| s.offset_days != self.offset_days)
    }
}

/// Reference to the task created on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
    pub url: String,
}

/// A persisted proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub status: ProposalStatus,
    #[serde(flatten)]
    pub draft: ProposalDraft,
    pub task: Option<TaskRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }
}

/// Partial update of the reviewer-editable fields. Unset fields are left
/// untouched; this doubles as the per-id override on approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalPatch {
    pub task_name: Option<String>,
    pub work_category: Option<String>,
    pub due_date: Option<String>,
}

impl ProposalPatch {
    pub fn is_empty(&self) -> bool {
        self.task_name.is_none() && self.work_category.is_none() && self.due_date.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.task_name {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "task_name".into(),
                    message: "task name cannot be blank".into(),
                });
            }
        }
        if let Some(due) = &self.due_date {
            if !is_valid_due_date(due) {
                return Err(ValidationError::InvalidValue {
                    field: "due_date".into(),
                    message: format!("'{due}' is not a YYYY-MM-DD date"),
                });
            }
        }
        Ok(())
    }

    /// Merge the set fields into `draft`.
    pub fn apply_to(&self, draft: &mut ProposalDraft) {
        if let Some(name) = &self.task_name {
            draft.task_name = name.clone();
        }
        if let Some(category) = &self.work_category {
            draft.work_category = category.clone();
        }
        if let Some(due) = &self.due_date {
            draft.due_date = Some(due.clone());
        }
    }
}
