//! # Duedraft Core Library
//!
//! Turns newly created workspace projects into reviewable task proposals with
//! an inferred due date, and writes approved proposals back as tasks. The
//! `duedraft` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Deadline**: keyword rule table, due-text parser and date arithmetic
//! - **Proposal**: proposal records and the synthesizer that builds them from
//!   (project, checklist item) pairs
//! - **Sync**: baseline diff of project ids with an atomic proposal commit
//! - **Review**: approve, edit and soft-delete pending proposals
//! - **Storage**: SQLite proposal/baseline store and TOML configuration
//! - **Integrations**: Notion source and task sink behind async traits
//!
//! ## Key Components
//!
//! - [`OffsetRuleTable`]: authoritative work-category to offset mapping
//! - [`ProposalSynthesizer`]: per-project proposal generation
//! - [`SyncEngine`]: one incremental sync run
//! - [`ReviewService`]: reviewer operations
//! - [`Database`]: proposal and baseline persistence

pub mod deadline;
pub mod error;
pub mod integrations;
pub mod proposal;
pub mod review;
pub mod storage;
pub mod sync;
pub mod workspace;

pub use deadline::{add_offset, parse_final_due_text, OffsetRule, OffsetRuleTable};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError, WorkspaceError};
pub use integrations::{NewTask, NotionClient, TaskSink, WorkspaceSource};
pub use proposal::{Proposal, ProposalDraft, ProposalPatch, ProposalStatus, ProposalSynthesizer};
pub use review::{ApprovalReport, ApprovalRequest, ReviewService};
pub use storage::{Config, Database};
pub use sync::{SyncEngine, SyncOutcome, SyncState};
pub use workspace::{ChecklistItem, Project};
