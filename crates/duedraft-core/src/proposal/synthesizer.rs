//! Proposal synthesis: cross-join a new project with the checklist.

use crate::deadline::{add_offset, parse_final_due_text, OffsetRuleTable};
use crate::workspace::{ChecklistItem, Project};

use super::model::{DeadlineBasis, DeadlineSuggestion, DueDateSource, ProposalDraft};

/// Turns (project, checklist item) pairs into proposal drafts.
///
/// The rule table always decides `due_date` and `offset_days`. The due-text
/// parser runs independently and only fills the advisory suggestion.
#[derive(Debug, Clone, Default)]
pub struct ProposalSynthesizer {
    rules: OffsetRuleTable,
}

impl ProposalSynthesizer {
    pub fn new(rules: OffsetRuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &OffsetRuleTable {
        &self.rules
    }

    /// Drafts for every checklist item that applies to `project`, in checklist order.
    pub fn synthesize(&self, project: &Project, checklist: &[ChecklistItem]) -> Vec<ProposalDraft> {
        checklist
            .iter()
            .filter(|item| item.applies_to(project))
            .map(|item| self.draft_for(project, item))
            .collect()
    }

    /// Drafts for several projects, flattened in project order.
    pub fn synthesize_all<'a, I>(&self, projects: I, checklist: &[ChecklistItem]) -> Vec<ProposalDraft>
    where
        I: IntoIterator<Item = &'a Project>,
    {
        projects
            .into_iter()
            .flat_map(|project| self.synthesize(project, checklist))
            .collect()
    }

    fn draft_for(&self, project: &Project, item: &ChecklistItem) -> ProposalDraft {
        let offset_days = self.rules.resolve_offset(&item.work_category);
        let due_date = add_offset(project.event_date.as_deref(), offset_days);
        let advisory = parse_final_due_text(&item.final_due_text)
            .map(|parsed| DeadlineSuggestion::from_event_date(parsed.offset_days));

        ProposalDraft {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            checklist_item_id: item.id.clone(),
            task_name: item.product_name.clone(),
            work_category: item.work_category.clone(),
            event_date: project.event_date.clone(),
            due_date,
            deadline_basis: DeadlineBasis::EventDate,
            offset_days,
            due_date_source: DueDateSource::RuleTable,
            final_due_text: item.final_due_text.clone(),
            advisory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checklist() -> Vec<ChecklistItem> {
        vec![
            ChecklistItem::new("c-main", "메인 포스터", "메인 디자인", "3주 전"),
            ChecklistItem::new("c-sns", "SNS 카드뉴스", "홍보", "당일")
                .with_event_categories(["세미나"]),
            ChecklistItem::new("c-sign", "현장 사인물", "운영", "다음주")
                .with_event_categories(["전시"]),
        ]
    }

    #[test]
    fn rule_table_is_authoritative() {
        let project = Project::new("p1", "봄 세미나").with_event_date("2024-03-10");
        let drafts = ProposalSynthesizer::default().synthesize(&project, &checklist());

        let main = &drafts[0];
        assert_eq!(main.offset_days, -21);
        assert_eq!(main.due_date.as_deref(), Some("2024-02-18"));
        assert_eq!(main.due_date_source, DueDateSource::RuleTable);
        assert_eq!(main.advisory, Some(DeadlineSuggestion::from_event_date(-21)));

        // Parser says same day, rule table says two weeks: rule table wins.
        let sns = &drafts[1];
        assert_eq!(sns.offset_days, -14);
        assert_eq!(sns.due_date.as_deref(), Some("2024-02-25"));
        assert_eq!(sns.advisory.map(|a| a.offset_days), Some(0));
    }

    #[test]
    fn unparsed_due_text_leaves_no_advisory() {
        let project = Project::new("p1", "행사");
        let drafts = ProposalSynthesizer::default().synthesize(&project, &checklist());
        let sign = drafts.iter().find(|d| d.checklist_item_id == "c-sign").unwrap();
        assert!(sign.advisory.is_none());
        assert_eq!(sign.offset_days, -7);
    }

    #[test]
    fn missing_event_date_keeps_offset_without_due_date() {
        let project = Project::new("p1", "날짜 미정");
        let drafts = ProposalSynthesizer::default().synthesize(&project, &checklist());
        assert_eq!(drafts.len(), 3);
        assert!(drafts.iter().all(|d| d.due_date.is_none()));
        assert_eq!(drafts[0].offset_days, -21);
    }

    #[test]
    fn category_filter_is_inclusive() {
        let seminar = Project::new("p1", "세미나").with_categories(["세미나"]);
        let ids: Vec<_> = ProposalSynthesizer::default()
            .synthesize(&seminar, &checklist())
            .into_iter()
            .map(|d| d.checklist_item_id)
            .collect();
        assert_eq!(ids, vec!["c-main", "c-sns"]);
    }

    #[test]
    fn drafts_copy_project_and_item_fields() {
        let project = Project::new("p9", "가을 전시")
            .with_event_date("2024-10-01")
            .with_categories(["전시"]);
        let drafts = ProposalSynthesizer::default().synthesize(&project, &checklist());
        let sign = drafts.iter().find(|d| d.checklist_item_id == "c-sign").unwrap();
        assert_eq!(sign.project_id, "p9");
        assert_eq!(sign.project_name, "가을 전시");
        assert_eq!(sign.task_name, "현장 사인물");
        assert_eq!(sign.final_due_text, "다음주");
        assert_eq!(sign.deadline_basis, DeadlineBasis::EventDate);
        assert_eq!(sign.due_date.as_deref(), Some("2024-09-24"));
    }

    #[test]
    fn synthesize_all_flattens_in_project_order() {
        let projects = vec![Project::new("a", "A"), Project::new("b", "B")];
        let drafts = ProposalSynthesizer::default().synthesize_all(&projects, &checklist());
        assert_eq!(drafts.len(), 6);
        assert!(drafts[..3].iter().all(|d| d.project_id == "a"));
        assert!(drafts[3..].iter().all(|d| d.project_id == "b"));
    }
}
