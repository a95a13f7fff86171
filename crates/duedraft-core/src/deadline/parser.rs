//! Final-due-text parser.
//!
//! Recognizes exactly three phrasings, tried in order:
//! `<n>일 전` (n days before), `<n>주 전` (n weeks before) and `당일`
//! (same day). Anything else yields `None`, which means "no inference" and is
//! distinct from an offset of zero.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DAYS_BEFORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*일\s*전").expect("valid days-before regex"));
static WEEKS_BEFORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*주\s*전").expect("valid weeks-before regex"));

const SAME_DAY_MARKER: &str = "당일";

/// Which phrasing produced the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuePattern {
    DaysBefore,
    WeeksBefore,
    SameDay,
}

/// Offset recovered from a final-due-text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOffset {
    pub offset_days: i64,
    pub pattern: DuePattern,
}

/// Parse a free-text deadline description.
pub fn parse_final_due_text(input: &str) -> Option<ParsedOffset> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(count) = capture_count(&DAYS_BEFORE_RE, text) {
        return Some(ParsedOffset {
            offset_days: -count,
            pattern: DuePattern::DaysBefore,
        });
    }

    if let Some(count) = capture_count(&WEEKS_BEFORE_RE, text) {
        return Some(ParsedOffset {
            offset_days: -count.saturating_mul(7),
            pattern: DuePattern::WeeksBefore,
        });
    }

    if text.contains(SAME_DAY_MARKER) {
        return Some(ParsedOffset {
            offset_days: 0,
            pattern: DuePattern::SameDay,
        });
    }

    None
}

// Counts that overflow i64 are treated as unrecognized.
fn capture_count(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn offset(text: &str) -> Option<i64> {
        parse_final_due_text(text).map(|p| p.offset_days)
    }

    #[test]
    fn recognizes_the_three_patterns() {
        assert_eq!(offset("7일 전"), Some(-7));
        assert_eq!(offset("2주 전"), Some(-14));
        assert_eq!(offset("당일"), Some(0));
    }

    #[test]
    fn empty_and_unknown_text_give_none() {
        assert_eq!(offset(""), None);
        assert_eq!(offset("   \t"), None);
        assert_eq!(offset("다음주"), None);
        assert_eq!(offset("행사 전"), None);
    }

    #[test]
    fn whitespace_between_tokens_is_allowed() {
        assert_eq!(offset("  3 일  전 "), Some(-3));
        assert_eq!(offset("1주전"), Some(-7));
    }

    #[test]
    fn days_pattern_takes_priority_over_weeks() {
        let parsed = parse_final_due_text("2주 전 또는 3일 전").unwrap();
        assert_eq!(parsed.offset_days, -3);
        assert_eq!(parsed.pattern, DuePattern::DaysBefore);
    }

    #[test]
    fn numbered_pattern_beats_same_day_marker() {
        assert_eq!(offset("당일 아니고 1일 전"), Some(-1));
    }

    #[test]
    fn pattern_embedded_in_sentence() {
        assert_eq!(offset("행사 10일 전까지 최종본"), Some(-10));
    }

    #[test]
    fn only_ascii_digits_count() {
        assert_eq!(offset("７일 전 또는 3일 전"), Some(-3));
        assert_eq!(offset("２주 전"), None);
    }

    #[test]
    fn overflowing_count_is_not_recognized_as_days() {
        assert_eq!(offset("99999999999999999999일 전"), None);
    }

    proptest! {
        #[test]
        fn days_before_round_trips(n in 0i64..10_000) {
            prop_assert_eq!(offset(&format!("{n}일 전")), Some(-n));
        }

        #[test]
        fn weeks_before_multiplies_by_seven(n in 0i64..1_000) {
            prop_assert_eq!(offset(&format!("{n}주 전")), Some(-n * 7));
        }

        #[test]
        fn ascii_text_never_parses(text in "[a-zA-Z0-9 .,!?-]{0,40}") {
            prop_assert_eq!(offset(&text), None);
        }
    }
}
