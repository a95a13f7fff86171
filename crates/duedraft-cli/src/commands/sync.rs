//! Sync subcommand: detect new Notion projects and create proposals.

use std::time::Duration;

use clap::Subcommand;
use duedraft_core::storage::SyncStateStore;
use duedraft_core::{
    Config, Database, NotionClient, ProposalStatus, ProposalSynthesizer, SyncEngine, SyncOutcome,
};
use tracing::{error, info};

use super::CommandResult;

#[derive(Subcommand)]
pub enum SyncAction {
    /// Run one incremental sync
    Run {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sync on a fixed interval until interrupted
    Watch {
        /// Minutes between runs (defaults to sync.interval_minutes)
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
    /// Show the stored baseline
    Status,
}

pub async fn run(action: SyncAction) -> CommandResult {
    match action {
        SyncAction::Run { json } => {
            let config = Config::load_effective()?;
            let outcome = sync_once(&config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        SyncAction::Watch { interval_minutes } => watch(interval_minutes).await?,
        SyncAction::Status => status()?,
    }
    Ok(())
}

async fn sync_once(config: &Config) -> Result<SyncOutcome, Box<dyn std::error::Error>> {
    let client = NotionClient::from_config(config)?;
    let db = Database::open()?;
    let synthesizer = ProposalSynthesizer::new(config.deadline.rule_table());
    let outcome = SyncEngine::new(&client, &db, synthesizer).run().await?;
    Ok(outcome)
}

fn print_outcome(outcome: &SyncOutcome) {
    println!("{}", outcome.summary());
    for proposal in outcome.proposals() {
        let draft = &proposal.draft;
        println!(
            "  {}  {} / {}  due {}",
            proposal.id,
            draft.project_name,
            draft.task_name,
            draft.due_date.as_deref().unwrap_or("-"),
        );
    }
}

async fn watch(interval_minutes: Option<u64>) -> CommandResult {
    let config = Config::load_effective()?;
    let minutes = interval_minutes.unwrap_or(config.sync.interval_minutes);
    if minutes == 0 {
        return Err("--interval-minutes must be at least 1".into());
    }

    info!(minutes, "watching for new projects");
    let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sync_once(&config).await {
                    Ok(outcome) => info!("{}", outcome.summary()),
                    Err(e) => error!(error = %e, "sync run failed; retrying next tick"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping watch");
                break;
            }
        }
    }
    Ok(())
}

fn status() -> CommandResult {
    let db = Database::open()?;
    match db.load_sync_state()? {
        Some(state) => {
            println!("known projects: {}", state.known_project_ids.len());
            println!("updated at:     {}", state.updated_at.to_rfc3339());
        }
        None => println!("no sync has run yet"),
    }
    println!(
        "proposals:      {} pending, {} approved, {} deleted",
        db.count_by_status(ProposalStatus::Pending)?,
        db.count_by_status(ProposalStatus::Approved)?,
        db.count_by_status(ProposalStatus::Deleted)?,
    );
    Ok(())
}
