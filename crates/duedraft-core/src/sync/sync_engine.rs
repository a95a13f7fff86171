//! Incremental sync: diff workspace projects against the baseline and turn
//! unseen projects into pending proposals.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::error::Result;
use crate::integrations::WorkspaceSource;
use crate::proposal::ProposalSynthesizer;
use crate::storage::SyncStateStore;
use crate::workspace::{ChecklistItem, Project};

use super::types::{SyncOutcome, SyncPlan, SyncState};

/// Decide what a run should write. Pure; the engine applies the plan.
///
/// Projects listed more than once are synthesized only for their first
/// occurrence.
pub fn plan_sync(
    state: Option<&SyncState>,
    projects: &[Project],
    checklist: &[ChecklistItem],
    synthesizer: &ProposalSynthesizer,
) -> SyncPlan {
    let project_ids: BTreeSet<String> = projects.iter().map(|p| p.id.clone()).collect();

    let Some(state) = state else {
        return SyncPlan::CreateBaseline { project_ids };
    };

    let mut seen = HashSet::new();
    let new_projects: Vec<&Project> = projects
        .iter()
        .filter(|p| !state.is_known(&p.id))
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();

    if new_projects.is_empty() {
        return SyncPlan::RefreshBaseline { project_ids };
    }

    let drafts = synthesizer.synthesize_all(new_projects.iter().copied(), checklist);
    SyncPlan::Commit {
        new_project_ids: new_projects.iter().map(|p| p.id.clone()).collect(),
        drafts,
        project_ids,
    }
}

/// Runs one sync pass against injected collaborators.
pub struct SyncEngine<'a> {
    source: &'a dyn WorkspaceSource,
    store: &'a dyn SyncStateStore,
    synthesizer: ProposalSynthesizer,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        source: &'a dyn WorkspaceSource,
        store: &'a dyn SyncStateStore,
        synthesizer: ProposalSynthesizer,
    ) -> Self {
        Self {
            source,
            store,
            synthesizer,
        }
    }

    /// Fetch, diff and persist.
    ///
    /// # Errors
    /// Any source or store failure aborts the run before the baseline moves,
    /// so the next run sees the same new projects again.
    pub async fn run(&self) -> Result<SyncOutcome> {
        let (projects, checklist) = tokio::try_join!(
            self.source.list_projects(),
            self.source.list_checklist_items()
        )?;
        debug!(
            projects = projects.len(),
            checklist_items = checklist.len(),
            "fetched workspace records"
        );

        let state = self.store.load_sync_state()?;
        let plan = plan_sync(state.as_ref(), &projects, &checklist, &self.synthesizer);
        self.apply(plan)
    }

    fn apply(&self, plan: SyncPlan) -> Result<SyncOutcome> {
        match plan {
            SyncPlan::CreateBaseline { project_ids } => {
                self.store.record_baseline(&project_ids)?;
                info!(
                    project_count = project_ids.len(),
                    "initial sync state created; skipping proposal generation for baseline"
                );
                Ok(SyncOutcome::BaselineCreated {
                    project_count: project_ids.len(),
                })
            }
            SyncPlan::RefreshBaseline { project_ids } => {
                self.store.record_baseline(&project_ids)?;
                info!(project_count = project_ids.len(), "no new projects detected");
                Ok(SyncOutcome::NoNewProjects {
                    project_count: project_ids.len(),
                })
            }
            SyncPlan::Commit {
                new_project_ids,
                drafts,
                project_ids,
            } => {
                let proposals = self.store.commit_sync(&drafts, &project_ids)?;
                info!(
                    new_projects = new_project_ids.len(),
                    proposals = proposals.len(),
                    "created proposals for new projects"
                );
                Ok(SyncOutcome::ProposalsCreated {
                    project_count: project_ids.len(),
                    new_project_ids,
                    proposals,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(ids: &[&str]) -> SyncState {
        SyncState {
            known_project_ids: ids.iter().map(|s| s.to_string()).collect(),
            updated_at: Utc::now(),
        }
    }

    fn checklist() -> Vec<ChecklistItem> {
        vec![
            ChecklistItem::new("c1", "포스터", "디자인", "2주 전"),
            ChecklistItem::new("c2", "배너", "홍보", ""),
        ]
    }

    #[test]
    fn first_run_only_records_baseline() {
        let projects = vec![Project::new("a", "A"), Project::new("b", "B")];
        let plan = plan_sync(None, &projects, &checklist(), &ProposalSynthesizer::default());
        match plan {
            SyncPlan::CreateBaseline { project_ids } => assert_eq!(project_ids.len(), 2),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn known_projects_refresh_baseline() {
        let projects = vec![Project::new("a", "A")];
        let plan = plan_sync(
            Some(&state(&["a", "gone"])),
            &projects,
            &checklist(),
            &ProposalSynthesizer::default(),
        );
        // Removed projects drop out of the baseline.
        assert_eq!(
            plan,
            SyncPlan::RefreshBaseline {
                project_ids: ["a".to_string()].into_iter().collect()
            }
        );
    }

    #[test]
    fn new_projects_produce_drafts_once() {
        let projects = vec![
            Project::new("a", "A"),
            Project::new("b", "B"),
            Project::new("b", "B again"),
        ];
        let plan = plan_sync(
            Some(&state(&["a"])),
            &projects,
            &checklist(),
            &ProposalSynthesizer::default(),
        );
        let SyncPlan::Commit {
            new_project_ids,
            drafts,
            project_ids,
        } = plan
        else {
            panic!("expected commit plan");
        };
        assert_eq!(new_project_ids, vec!["b"]);
        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| d.project_name == "B"));
        assert_eq!(project_ids.len(), 2);
    }

    #[test]
    fn outcome_summary_mentions_counts() {
        let outcome = SyncOutcome::NoNewProjects { project_count: 4 };
        assert!(outcome.summary().contains('4'));
        assert!(outcome.proposals().is_empty());
    }
}
