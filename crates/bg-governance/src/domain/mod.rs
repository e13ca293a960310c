//! Domain layer: entities, the pure governance rules, and errors.

pub mod entities;
pub mod errors;
pub mod membership;
pub mod quorum;
pub mod registry;
pub mod voting;

pub use entities::*;
pub use errors::*;
pub use quorum::{QuorumOutcome, VoteTally};
pub use voting::{VoteSummary, VoteTransition};
