pub mod auth;
pub mod config;
pub mod deadline;
pub mod proposal;
pub mod sync;

/// Error type shared by every subcommand.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
