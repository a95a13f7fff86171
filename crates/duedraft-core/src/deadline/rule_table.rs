//! Keyword-to-offset rule table.
//!
//! Rules are evaluated in table order and the first keyword contained in the
//! work category wins. More specific keywords must therefore sit above more
//! general ones; the order of the table is the only tie-break.

use serde::{Deserialize, Serialize};

/// Offset used when no rule keyword matches: one week before the event.
pub const DEFAULT_OFFSET_DAYS: i64 = -7;

/// A single `(keyword, offset)` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRule {
    pub keyword: String,
    pub offset_days: i64,
}

impl OffsetRule {
    pub fn new(keyword: impl Into<String>, offset_days: i64) -> Self {
        Self {
            keyword: keyword.into(),
            offset_days,
        }
    }
}

/// Ordered rule table with a default fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRuleTable {
    rules: Vec<OffsetRule>,
    default_offset_days: i64,
}

impl OffsetRuleTable {
    pub fn new(rules: Vec<OffsetRule>, default_offset_days: i64) -> Self {
        Self {
            rules,
            default_offset_days,
        }
    }

    /// Built-in table: core deliverables three weeks out, design and
    /// promotion two weeks, operations one week.
    pub fn builtin_rules() -> Vec<OffsetRule> {
        vec![
            OffsetRule::new("메인", -21),
            OffsetRule::new("핵심", -21),
            OffsetRule::new("디자인", -14),
            OffsetRule::new("홍보", -14),
            OffsetRule::new("운영", -7),
        ]
    }

    pub fn rules(&self) -> &[OffsetRule] {
        &self.rules
    }

    pub fn default_offset_days(&self) -> i64 {
        self.default_offset_days
    }

    /// Resolve the offset for a work category.
    ///
    /// Matching is a case-sensitive substring test with no normalization.
    pub fn resolve_offset(&self, work_category: &str) -> i64 {
        self.matching_rule(work_category)
            .map(|rule| rule.offset_days)
            .unwrap_or(self.default_offset_days)
    }

    /// The rule that decides `work_category`, if any.
    pub fn matching_rule(&self, work_category: &str) -> Option<&OffsetRule> {
        self.rules
            .iter()
            .find(|rule| !rule.keyword.is_empty() && work_category.contains(&rule.keyword))
    }
}

impl Default for OffsetRuleTable {
    fn default() -> Self {
        Self::new(Self::builtin_rules(), DEFAULT_OFFSET_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn builtin_keywords_resolve() {
        let table = OffsetRuleTable::default();
        assert_eq!(table.resolve_offset("메인 포스터"), -21);
        assert_eq!(table.resolve_offset("핵심 제작물"), -21);
        assert_eq!(table.resolve_offset("디자인"), -14);
        assert_eq!(table.resolve_offset("SNS 홍보"), -14);
        assert_eq!(table.resolve_offset("현장 운영"), -7);
    }

    #[test]
    fn unmatched_category_uses_default() {
        let table = OffsetRuleTable::default();
        assert_eq!(table.resolve_offset(""), DEFAULT_OFFSET_DAYS);
        assert_eq!(table.resolve_offset("기타"), DEFAULT_OFFSET_DAYS);
    }

    #[test]
    fn table_order_beats_string_order() {
        let table = OffsetRuleTable::default();
        // "운영" appears first in the string but "디자인" sits higher in the table.
        assert_eq!(table.resolve_offset("운영/디자인"), -14);
        assert_eq!(table.resolve_offset("홍보, 메인"), -21);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let table = OffsetRuleTable::new(vec![OffsetRule::new("Main", -30)], -7);
        assert_eq!(table.resolve_offset("Main visual"), -30);
        assert_eq!(table.resolve_offset("main visual"), -7);
    }

    #[test]
    fn empty_keyword_never_matches() {
        let table = OffsetRuleTable::new(vec![OffsetRule::new("", -99)], -7);
        assert_eq!(table.resolve_offset("anything"), -7);
    }

    proptest! {
        #[test]
        fn ascii_categories_fall_back_to_default(category in "[a-zA-Z0-9 ,/_-]{0,40}") {
            let table = OffsetRuleTable::default();
            prop_assert_eq!(table.resolve_offset(&category), DEFAULT_OFFSET_DAYS);
        }

        #[test]
        fn highest_priority_keyword_wins(
            prefix in "[a-z ]{0,8}",
            middle in "[a-z ]{0,8}",
            suffix in "[a-z ]{0,8}",
            hi in 0usize..5,
            lo in 0usize..5,
        ) {
            let table = OffsetRuleTable::default();
            let rules = table.rules();
            let (first, second) = (hi.min(lo), hi.max(lo));
            // Put the lower-priority keyword first in the string.
            let category = format!(
                "{prefix}{}{middle}{}{suffix}",
                rules[second].keyword, rules[first].keyword
            );
            prop_assert_eq!(table.resolve_offset(&category), rules[first].offset_days);
        }
    }
}
