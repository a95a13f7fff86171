//! Reviewer operations over pending proposals.
//!
//! Approval validates every override up front, then handles one proposal at a
//! time: overrides are merged, the task sink is called, and only after it
//! succeeds is the proposal moved to `approved`. Ids that are missing or no
//! longer pending are skipped without error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ValidationError};
use crate::integrations::{NewTask, TaskSink};
use crate::proposal::{Proposal, ProposalPatch, TaskRef};
use crate::storage::ProposalStore;

/// One id to approve, with optional field overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub proposal_id: String,
    #[serde(default)]
    pub overrides: ProposalPatch,
}

impl ApprovalRequest {
    pub fn new(proposal_id: impl Into<String>) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            overrides: ProposalPatch::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: ProposalPatch) -> Self {
        self.overrides = overrides;
        self
    }

    /// Pair each id with its entry in `overrides`, if any. Order follows `ids`.
    pub fn batch(ids: &[String], overrides: &HashMap<String, ProposalPatch>) -> Vec<Self> {
        ids.iter()
            .map(|id| Self {
                proposal_id: id.clone(),
                overrides: overrides.get(id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// A proposal that was written back as a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedTask {
    pub proposal_id: String,
    pub task: TaskRef,
}

/// A proposal whose task could not be created or recorded. It stays pending
/// unless the failure happened after the sink call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalFailure {
    pub proposal_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalReport {
    pub approved: Vec<ApprovedTask>,
    pub failed: Vec<ApprovalFailure>,
}

impl ApprovalReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ReviewService<'a> {
    store: &'a dyn ProposalStore,
    sink: &'a dyn TaskSink,
    status_label: String,
}

impl<'a> ReviewService<'a> {
    /// `status_label` is written to the status property of created tasks.
    pub fn new(
        store: &'a dyn ProposalStore,
        sink: &'a dyn TaskSink,
        status_label: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sink,
            status_label: status_label.into(),
        }
    }

    pub fn list_pending(&self) -> Result<Vec<Proposal>> {
        self.store.list_pending()
    }

    pub fn get(&self, id: &str) -> Result<Option<Proposal>> {
        self.store.get(id)
    }

    /// Partial edit of a pending proposal.
    pub fn update(&self, id: &str, patch: &ProposalPatch) -> Result<Proposal> {
        patch.validate()?;
        self.store.update(id, patch)
    }

    /// Soft delete.
    pub fn delete(&self, id: &str) -> Result<Proposal> {
        let proposal = self.store.mark_deleted(id)?;
        info!(proposal_id = id, "proposal deleted");
        Ok(proposal)
    }

    /// Approve a batch of proposals.
    ///
    /// # Errors
    /// Fails before touching anything when `requests` is empty or an override
    /// is invalid, and stops when the store cannot be read. Sink and write
    /// failures for a single proposal are reported in
    /// [`ApprovalReport::failed`] and do not stop the batch.
    pub async fn approve(&self, requests: &[ApprovalRequest]) -> Result<ApprovalReport> {
        if requests.is_empty() {
            return Err(ValidationError::EmptyCollection("approval requests".into()).into());
        }
        for request in requests {
            request.overrides.validate()?;
        }

        let mut report = ApprovalReport::default();
        for request in requests {
            let id = request.proposal_id.as_str();
            let Some(mut proposal) = self.store.get(id)? else {
                debug!(proposal_id = id, "approval skipped: not found");
                continue;
            };
            if !proposal.is_pending() {
                debug!(proposal_id = id, status = %proposal.status, "approval skipped: not pending");
                continue;
            }

            request.overrides.apply_to(&mut proposal.draft);
            let draft = &proposal.draft;
            let new_task = NewTask {
                task_name: draft.task_name.clone(),
                work_category: draft.work_category.clone(),
                project_ref: draft.project_id.clone(),
                due_date: draft.due_date.clone(),
                status_label: self.status_label.clone(),
            };

            let outcome = match self.sink.create_task(&new_task).await {
                Ok(task) => self
                    .store
                    .mark_approved(id, &request.overrides, &task)
                    .map(|_| task),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(task) => {
                    info!(proposal_id = id, task_id = %task.id, "proposal approved");
                    report.approved.push(ApprovedTask {
                        proposal_id: id.to_string(),
                        task,
                    });
                }
                Err(e) => {
                    warn!(proposal_id = id, error = %e, "approval failed");
                    report.failed.push(ApprovalFailure {
                        proposal_id: id.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, WorkspaceError};
    use crate::proposal::{DeadlineBasis, DueDateSource, ProposalDraft, ProposalStatus};
    use crate::storage::Database;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        created: Mutex<Vec<NewTask>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl TaskSink for RecordingSink {
        async fn create_task(&self, task: &NewTask) -> Result<TaskRef> {
            if self.fail_for.as_deref() == Some(task.task_name.as_str()) {
                return Err(WorkspaceError::Api {
                    status: 400,
                    code: "validation_error".into(),
                    message: "rejected".into(),
                }
                .into());
            }
            let mut created = self.created.lock().unwrap();
            created.push(task.clone());
            let n = created.len();
            Ok(TaskRef {
                id: format!("task-{n}"),
                url: format!("https://notion.test/task-{n}"),
            })
        }
    }

    fn draft(task_name: &str) -> ProposalDraft {
        ProposalDraft {
            project_id: "p1".into(),
            project_name: "봄 세미나".into(),
            checklist_item_id: format!("c-{task_name}"),
            task_name: task_name.into(),
            work_category: "디자인".into(),
            event_date: Some("2024-03-10".into()),
            due_date: Some("2024-02-25".into()),
            deadline_basis: DeadlineBasis::EventDate,
            offset_days: -14,
            due_date_source: DueDateSource::RuleTable,
            final_due_text: String::new(),
            advisory: None,
        }
    }

    #[tokio::test]
    async fn approve_skips_missing_ids() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터")]).unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");

        let report = review
            .approve(&[
                ApprovalRequest::new("does-not-exist"),
                ApprovalRequest::new(created[0].id.clone()),
            ])
            .await
            .unwrap();

        assert_eq!(report.approved.len(), 1);
        assert_eq!(report.approved[0].proposal_id, created[0].id);
        assert!(report.is_success());
        let stored = db.get(&created[0].id).unwrap().unwrap();
        assert_eq!(stored.status, ProposalStatus::Approved);
        assert_eq!(stored.task.unwrap().id, "task-1");
    }

    #[tokio::test]
    async fn overrides_reach_the_sink_and_the_record() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터")]).unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");

        let overrides = ProposalPatch {
            due_date: Some("2024-02-20".into()),
            ..ProposalPatch::default()
        };
        review
            .approve(&[ApprovalRequest::new(created[0].id.clone()).with_overrides(overrides)])
            .await
            .unwrap();

        let sent = sink.created.lock().unwrap();
        assert_eq!(sent[0].due_date.as_deref(), Some("2024-02-20"));
        assert_eq!(sent[0].task_name, "포스터");
        assert_eq!(sent[0].project_ref, "p1");
        assert_eq!(sent[0].status_label, "진행 전");
        let stored = db.get(&created[0].id).unwrap().unwrap();
        assert_eq!(stored.draft.due_date.as_deref(), Some("2024-02-20"));
    }

    #[tokio::test]
    async fn already_approved_is_not_sent_twice() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터")]).unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");
        let request = [ApprovalRequest::new(created[0].id.clone())];

        review.approve(&request).await.unwrap();
        let second = review.approve(&request).await.unwrap();

        assert!(second.approved.is_empty());
        assert_eq!(sink.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_leaves_proposal_pending() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터"), draft("배너")]).unwrap();
        let sink = RecordingSink {
            fail_for: Some("포스터".into()),
            ..RecordingSink::default()
        };
        let review = ReviewService::new(&db, &sink, "진행 전");

        let report = review
            .approve(&ApprovalRequest::batch(
                &[created[0].id.clone(), created[1].id.clone()],
                &HashMap::new(),
            ))
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].proposal_id, created[0].id);
        assert_eq!(report.approved.len(), 1);
        assert!(db.get(&created[0].id).unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn invalid_override_rejects_whole_batch() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터"), draft("배너")]).unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");

        let bad = ProposalPatch {
            due_date: Some("2024/02/20".into()),
            ..ProposalPatch::default()
        };
        let err = review
            .approve(&[
                ApprovalRequest::new(created[0].id.clone()),
                ApprovalRequest::new(created[1].id.clone()).with_overrides(bad),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(sink.created.lock().unwrap().is_empty());
        assert_eq!(db.list_pending().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");
        assert!(matches!(
            review.approve(&[]).await,
            Err(CoreError::Validation(ValidationError::EmptyCollection(_)))
        ));
    }

    #[test]
    fn batch_pairs_ids_with_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "b".to_string(),
            ProposalPatch {
                task_name: Some("새 이름".into()),
                ..ProposalPatch::default()
            },
        );
        let batch = ApprovalRequest::batch(&["a".into(), "b".into()], &overrides);
        assert!(batch[0].overrides.is_empty());
        assert_eq!(batch[1].overrides.task_name.as_deref(), Some("새 이름"));
    }

    #[test]
    fn delete_then_update_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_many(&[draft("포스터")]).unwrap();
        let sink = RecordingSink::default();
        let review = ReviewService::new(&db, &sink, "진행 전");

        review.delete(&created[0].id).unwrap();
        let patch = ProposalPatch {
            task_name: Some("다른 이름".into()),
            ..ProposalPatch::default()
        };
        assert!(matches!(
            review.update(&created[0].id, &patch),
            Err(CoreError::NotEditable { .. })
        ));
        assert!(review.list_pending().unwrap().is_empty());
    }
}
