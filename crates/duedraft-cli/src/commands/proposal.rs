use std::collections::HashMap;
use std::path::PathBuf;

use clap::Subcommand;
use duedraft_core::review::{ApprovalRequest, ReviewService};
use duedraft_core::storage::ProposalStore;
use duedraft_core::{Config, Database, NotionClient, Proposal, ProposalPatch};

use super::CommandResult;

#[derive(Subcommand)]
pub enum ProposalAction {
    /// List pending proposals, oldest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one proposal
    Show {
        id: String,
    },
    /// Edit fields of a pending proposal
    Update {
        id: String,
        #[arg(long)]
        task_name: Option<String>,
        #[arg(long)]
        work_category: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        due_date: Option<String>,
    },
    /// Reject a proposal (kept as deleted)
    Delete {
        id: String,
    },
    /// Approve proposals and create their Notion tasks
    Approve {
        /// Proposal ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// JSON file mapping id -> {task_name, work_category, due_date}
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
}

pub async fn run(action: ProposalAction) -> CommandResult {
    match action {
        ProposalAction::List { json } => {
            let db = Database::open()?;
            let pending = db.list_pending()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else if pending.is_empty() {
                println!("no pending proposals");
            } else {
                print_table(&pending);
            }
        }
        ProposalAction::Show { id } => {
            let db = Database::open()?;
            let proposal = db.get(&id)?
                .ok_or_else(|| format!("proposal not found: {id}"))?;
            print_detail(&proposal);
        }
        ProposalAction::Update {
            id,
            task_name,
            work_category,
            due_date,
        } => {
            let patch = ProposalPatch {
                task_name,
                work_category,
                due_date,
            };
            if patch.is_empty() {
                return Err("nothing to update: pass --task-name, --work-category or --due-date".into());
            }
            patch.validate()?;
            let db = Database::open()?;
            let updated = db.update(&id, &patch)?;
            print_detail(&updated);
        }
        ProposalAction::Delete { id } => {
            let db = Database::open()?;
            db.mark_deleted(&id)?;
            println!("deleted {id}");
        }
        ProposalAction::Approve { ids, overrides } => approve(ids, overrides).await?,
    }
    Ok(())
}

async fn approve(ids: Vec<String>, overrides: Option<PathBuf>) -> CommandResult {
    let overrides: HashMap<String, ProposalPatch> = match overrides {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
        None => HashMap::new(),
    };

    let config = Config::load_effective()?;
    let client = NotionClient::from_config(&config)?;
    let db = Database::open()?;
    let review = ReviewService::new(&db, &client, config.sync.default_task_status.clone());

    let report = review
        .approve(&ApprovalRequest::batch(&ids, &overrides))
        .await?;

    for approved in &report.approved {
        println!("approved {}  {}", approved.proposal_id, approved.task.url);
    }
    let skipped = ids.len() - report.approved.len() - report.failed.len();
    if skipped > 0 {
        println!("skipped {skipped} id(s) not found or not pending");
    }
    for failure in &report.failed {
        eprintln!("failed {}: {}", failure.proposal_id, failure.message);
    }
    if !report.is_success() {
        return Err(format!("{} approval(s) failed", report.failed.len()).into());
    }
    Ok(())
}

fn print_table(proposals: &[Proposal]) {
    println!(
        "{:<36}  {:<20}  {:<20}  {:<10}  {:>6}  {}",
        "ID", "PROJECT", "TASK", "DUE", "OFFSET", "ADVISORY"
    );
    for p in proposals {
        let draft = &p.draft;
        println!(
            "{:<36}  {:<20}  {:<20}  {:<10}  {:>6}  {}",
            p.id,
            draft.project_name,
            draft.task_name,
            draft.due_date.as_deref().unwrap_or("-"),
            draft.offset_days,
            advisory_label(p),
        );
    }
}

fn advisory_label(p: &Proposal) -> String {
    let draft = &p.draft;
    match draft.advisory {
        None => "-".to_string(),
        Some(s) => {
            let date = draft.advisory_due_date().unwrap_or_else(|| "-".to_string());
            let marker = if draft.advisory_disagrees() { " (differs)" } else { "" };
            format!("{:+}d {date}{marker}", s.offset_days)
        }
    }
}

fn print_detail(p: &Proposal) {
    let draft = &p.draft;
    println!("id:              {}", p.id);
    println!("status:          {}", p.status);
    println!("project:         {} ({})", draft.project_name, draft.project_id);
    println!("task:            {}", draft.task_name);
    println!("work category:   {}", draft.work_category);
    println!("event date:      {}", draft.event_date.as_deref().unwrap_or("-"));
    println!(
        "due date:        {} ({:+}d from {}, {})",
        draft.due_date.as_deref().unwrap_or("-"),
        draft.offset_days,
        draft.deadline_basis.as_str(),
        draft.due_date_source.as_str(),
    );
    println!("final due text:  {}", draft.final_due_text);
    println!("advisory:        {}", advisory_label(p));
    if let Some(task) = &p.task {
        println!("task page:       {}", task.url);
    }
    println!("created at:      {}", p.created_at.to_rfc3339());
}
