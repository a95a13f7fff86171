//! Incremental project-to-proposal synchronization.
//!
//! A run diffs the workspace project list against the stored baseline,
//! synthesizes proposals for unseen projects, and commits proposals plus the
//! refreshed baseline as a single unit.

pub mod sync_engine;
pub mod types;

pub use sync_engine::{plan_sync, SyncEngine};
pub use types::{SyncOutcome, SyncPlan, SyncState};
