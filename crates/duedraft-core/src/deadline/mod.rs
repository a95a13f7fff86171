//! Deadline inference: rule table, due-text parser and date arithmetic.
//!
//! All functions here are pure and infallible.

pub mod date_math;
pub mod parser;
pub mod rule_table;

pub use date_math::{add_offset, is_valid_due_date, parse_event_date};
pub use parser::{parse_final_due_text, DuePattern, ParsedOffset};
pub use rule_table::{OffsetRule, OffsetRuleTable, DEFAULT_OFFSET_DAYS};
