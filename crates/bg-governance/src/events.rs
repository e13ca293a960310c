//! Events published after a governance or voting transaction commits.

use crate::domain::{SubmissionStatus, Verdict, VoteValue};
use serde::Serialize;
use shared_types::{ProgramName, SubmissionId, Timestamp, WalletAddress};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ReviewerAdded {
        program: ProgramName,
        address: WalletAddress,
        /// In-flight submissions whose voting status was reset.
        reset_submissions: usize,
        at: Timestamp,
    },
    ReviewerRemoved {
        program: ProgramName,
        address: WalletAddress,
        /// Votes stripped from in-flight submissions.
        votes_removed: usize,
        at: Timestamp,
    },
    ManagerAssigned {
        program: ProgramName,
        address: WalletAddress,
        previous: Option<WalletAddress>,
        /// Manager votes cleared from in-flight submissions.
        votes_cleared: usize,
        at: Timestamp,
    },
    ManagerRemoved {
        program: ProgramName,
        address: WalletAddress,
        votes_cleared: usize,
        at: Timestamp,
    },
    ReviewerVoteCast {
        submission: SubmissionId,
        program: ProgramName,
        reviewer: WalletAddress,
        vote: VoteValue,
        replaced: bool,
        at: Timestamp,
    },
    QuorumReached {
        submission: SubmissionId,
        program: ProgramName,
        verdict: Verdict,
        at: Timestamp,
    },
    ManagerVoteCast {
        submission: SubmissionId,
        program: ProgramName,
        manager: WalletAddress,
        vote: VoteValue,
        at: Timestamp,
    },
    SubmissionFinalized {
        submission: SubmissionId,
        program: ProgramName,
        status: SubmissionStatus,
        finalized_by: WalletAddress,
        at: Timestamp,
    },
}

impl GovernanceEvent {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::ReviewerAdded { .. } => "reviewer_added",
            GovernanceEvent::ReviewerRemoved { .. } => "reviewer_removed",
            GovernanceEvent::ManagerAssigned { .. } => "manager_assigned",
            GovernanceEvent::ManagerRemoved { .. } => "manager_removed",
            GovernanceEvent::ReviewerVoteCast { .. } => "reviewer_vote_cast",
            GovernanceEvent::QuorumReached { .. } => "quorum_reached",
            GovernanceEvent::ManagerVoteCast { .. } => "manager_vote_cast",
            GovernanceEvent::SubmissionFinalized { .. } => "submission_finalized",
        }
    }
}
