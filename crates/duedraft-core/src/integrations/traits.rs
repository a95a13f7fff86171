use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::proposal::TaskRef;
use crate::workspace::{ChecklistItem, Project};

/// Read side of the workspace: full scans of the project and checklist
/// databases. Implementations normalize category fields to trimmed,
/// non-empty labels before returning.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn list_checklist_items(&self) -> Result<Vec<ChecklistItem>>;
}

/// Task to create when a proposal is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub task_name: String,
    pub work_category: String,
    /// Id of the source project page.
    pub project_ref: String,
    pub due_date: Option<String>,
    pub status_label: String,
}

/// Write side of the workspace. Called once per approved proposal; callers
/// are responsible for not approving the same proposal twice.
#[async_trait]
pub trait TaskSink: Send + Sync {
    async fn create_task(&self, task: &NewTask) -> Result<TaskRef>;
}
