//! Task proposals: the records reviewers approve or reject, and the
//! synthesizer that creates them.

pub mod model;
pub mod synthesizer;

pub use model::{
    DeadlineBasis, DeadlineSuggestion, DueDateSource, Proposal, ProposalDraft, ProposalPatch,
    ProposalStatus, TaskRef,
};
pub use synthesizer::ProposalSynthesizer;
