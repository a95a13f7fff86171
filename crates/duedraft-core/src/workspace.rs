//! Records read from the workspace database.
//!
//! Both record types are read-only to the core. Category sets arrive already
//! normalized (trimmed, non-empty) from the source collaborator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A project (event) page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable page id.
    pub id: String,
    pub name: String,
    /// Raw event date as delivered by the source; may be missing or malformed.
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

/// A reusable checklist entry describing one deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub product_name: String,
    /// Free text, matched against the rule table as a single string.
    pub work_category: String,
    /// Free-text deadline, e.g. "7일 전".
    pub final_due_text: String,
    /// Empty means the item applies to every project.
    #[serde(default)]
    pub event_categories: BTreeSet<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            event_date: None,
            categories: BTreeSet::new(),
        }
    }

    pub fn with_event_date(mut self, date: impl Into<String>) -> Self {
        self.event_date = Some(date.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

impl ChecklistItem {
    pub fn new(
        id: impl Into<String>,
        product_name: impl Into<String>,
        work_category: impl Into<String>,
        final_due_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            product_name: product_name.into(),
            work_category: work_category.into(),
            final_due_text: final_due_text.into(),
            event_categories: BTreeSet::new(),
        }
    }

    pub fn with_event_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Category metadata is advisory: an empty set on either side means the
    /// item applies, otherwise the sets must overlap.
    pub fn applies_to(&self, project: &Project) -> bool {
        self.event_categories.is_empty()
            || project.categories.is_empty()
            || !self.event_categories.is_disjoint(&project.categories)
    }
}
