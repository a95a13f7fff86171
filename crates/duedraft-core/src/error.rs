//! Core error types for duedraft-core.
//!
//! The hierarchy mirrors the collaborators the core talks to: the SQLite
//! store, the TOML configuration, and the Notion workspace. Pure deadline
//! logic never fails and therefore has no error type of its own.

use std::path::PathBuf;
use thiserror::Error;

use crate::proposal::ProposalStatus;

/// Core error type for duedraft-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Workspace (Notion) collaborator errors
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Proposal id does not exist
    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    /// Status change not allowed from the current status
    #[error("Proposal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    /// Reviewer edits are only accepted while pending
    #[error("Proposal {id} is {status} and can no longer be edited")]
    NotEditable { id: String, status: ProposalStatus },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised by the Notion workspace client.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Transport-level failure (DNS, TLS, timeout, body decode)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Notion answered with a non-success status
    #[error("Notion API error (HTTP {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Token rejected
    #[error("Notion rejected the API token (HTTP 401)")]
    Unauthorized,

    /// No token available from env or keyring
    #[error("No Notion token configured. Set NOTION_TOKEN or run `duedraft auth set-token`.")]
    MissingCredentials,

    /// Response did not have the expected shape
    #[error("Malformed Notion response: {0}")]
    MalformedResponse(String),

    /// OS keyring failure
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
