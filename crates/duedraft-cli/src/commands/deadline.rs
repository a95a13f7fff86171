use clap::Subcommand;
use duedraft_core::deadline::{add_offset, parse_event_date, parse_final_due_text};
use duedraft_core::Config;
use serde::Serialize;

use super::CommandResult;

#[derive(Subcommand)]
pub enum DeadlineAction {
    /// Show the offset and due date a checklist item would get
    Preview {
        /// Work category of the checklist item
        #[arg(long)]
        work_category: String,
        /// Free-text final due point (e.g. "2주 전")
        #[arg(long, default_value = "")]
        due_text: String,
        /// Event date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        event_date: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Preview {
    work_category: String,
    matched_keyword: Option<String>,
    offset_days: i64,
    due_date: Option<String>,
    advisory_offset_days: Option<i64>,
    advisory_due_date: Option<String>,
}

pub fn run(action: DeadlineAction) -> CommandResult {
    match action {
        DeadlineAction::Preview {
            work_category,
            due_text,
            event_date,
            json,
        } => {
            if let Some(raw) = &event_date {
                if parse_event_date(raw).is_none() {
                    eprintln!("warning: '{raw}' is not a recognized date; due date will be empty");
                }
            }

            let config = Config::load()?;
            let rules = config.deadline.rule_table();
            let offset_days = rules.resolve_offset(&work_category);
            let advisory = parse_final_due_text(&due_text);
            let preview = Preview {
                matched_keyword: rules.matching_rule(&work_category).map(|r| r.keyword.clone()),
                offset_days,
                due_date: add_offset(event_date.as_deref(), offset_days),
                advisory_offset_days: advisory.map(|a| a.offset_days),
                advisory_due_date: advisory
                    .and_then(|a| add_offset(event_date.as_deref(), a.offset_days)),
                work_category,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print_preview(&preview);
            }
        }
    }
    Ok(())
}

fn print_preview(p: &Preview) {
    let rule = p.matched_keyword.as_deref().unwrap_or("(default)");
    println!(
        "due date:  {}  ({:+}d, rule: {rule})",
        p.due_date.as_deref().unwrap_or("-"),
        p.offset_days
    );
    match p.advisory_offset_days {
        Some(offset) => println!(
            "advisory:  {}  ({offset:+}d from due text, not applied)",
            p.advisory_due_date.as_deref().unwrap_or("-")
        ),
        None => println!("advisory:  -"),
    }
}
