mod config;
pub mod database;
pub mod migrations;
pub mod store;

pub use config::{
    ChecklistProperties, Config, DeadlineConfig, NotionConfig, ProjectProperties, SyncConfig,
    TaskProperties,
};
pub use database::Database;
pub use store::{ProposalStore, SyncStateStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the duedraft data directory, creating it if needed.
///
/// `DUEDRAFT_DATA_DIR` wins when set. Otherwise `~/.config/duedraft/`, or
/// `~/.config/duedraft-dev/` when `DUEDRAFT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("DUEDRAFT_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DUEDRAFT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("duedraft-dev")
            } else {
                base_dir.join("duedraft")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
