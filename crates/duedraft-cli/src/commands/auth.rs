use clap::Subcommand;
use duedraft_core::integrations::keyring_store::{self, TokenSource, NOTION_TOKEN_KEY};

use super::CommandResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the Notion integration token in the OS keyring
    SetToken {
        token: String,
    },
    /// Remove the stored token
    Clear,
    /// Show where the active token comes from
    Status,
}

pub fn run(action: AuthAction) -> CommandResult {
    match action {
        AuthAction::SetToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("token cannot be empty".into());
            }
            keyring_store::set(NOTION_TOKEN_KEY, token)?;
            println!("Notion token saved");
        }
        AuthAction::Clear => {
            keyring_store::delete(NOTION_TOKEN_KEY)?;
            println!("Notion token removed");
        }
        AuthAction::Status => match keyring_store::resolve_notion_token() {
            Ok((_, TokenSource::Env)) => println!("authenticated (NOTION_TOKEN)"),
            Ok((_, TokenSource::Keyring)) => println!("authenticated (keyring)"),
            Err(duedraft_core::WorkspaceError::MissingCredentials) => {
                println!("not authenticated")
            }
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
