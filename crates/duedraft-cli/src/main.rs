use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "duedraft", version, about = "Deadline-aware task proposals from Notion projects")]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project sync
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Review pending proposals
    Proposal {
        #[command(subcommand)]
        action: commands::proposal::ProposalAction,
    },
    /// Deadline inference tools
    Deadline {
        #[command(subcommand)]
        action: commands::deadline::DeadlineAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Notion token management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("DUEDRAFT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("duedraft_core={default_level},duedraft={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sync { action } => commands::sync::run(action).await,
        Commands::Proposal { action } => commands::proposal::run(action).await,
        Commands::Deadline { action } => commands::deadline::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
