//! Driving ports (Inbound API)

use crate::domain::{
    BountyProgram, GovernanceResult, ManagerVote, Submission, SubmissionStatus, Verdict, Vote,
    VoteSummary, VotingStatus,
};
use crate::ports::AttachmentMeta;
use async_trait::async_trait;
use serde::Serialize;
use shared_types::{ProgramName, SubmissionId, Timestamp, WalletAddress};

/// Activity of one role holder within a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberActivity {
    pub address: WalletAddress,
    /// `None` if the Membership Index has no record for the address.
    pub assigned_date: Option<Timestamp>,
    /// Submissions of the program carrying this member's vote.
    pub reviewed_submissions: usize,
    /// In-flight submissions still waiting for this member's vote.
    pub pending_submissions: usize,
    pub last_active: Option<Timestamp>,
}

/// Result of a reviewer vote cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCastReceipt {
    pub submission: Submission,
    pub vote_summary: VoteSummary,
    pub quorum_reached: bool,
    pub attachments: Vec<AttachmentMeta>,
}

/// Read model of a submission's review progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatusView {
    pub submission_id: SubmissionId,
    pub program: ProgramName,
    pub status: SubmissionStatus,
    pub voting_status: VotingStatus,
    pub verdict: Option<Verdict>,
    pub manager_vote: Option<ManagerVote>,
    pub vote_summary: VoteSummary,
    pub can_finalize: bool,
}

/// Governance and voting operations.
///
/// Every mutating call is one atomic transaction: on error nothing was
/// written.
#[async_trait]
pub trait GovernanceApi: Send + Sync {
    /// Add a reviewer to a program's panel.
    ///
    /// Resets `votingStatus` to `pending` on in-flight submissions that had
    /// not reached quorum.
    async fn add_reviewer(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram>;

    /// Remove a reviewer, strip their votes from in-flight submissions and
    /// recompute those submissions against the smaller panel.
    async fn remove_reviewer(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram>;

    async fn list_reviewers(&self, program: &ProgramName) -> GovernanceResult<Vec<MemberActivity>>;

    /// Assign a manager, replacing any current one.
    async fn add_manager(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram>;

    /// Replace the current manager. `NotFound` if none is assigned.
    async fn change_manager(
        &self,
        program: &ProgramName,
        new_address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram>;

    async fn remove_manager(&self, program: &ProgramName) -> GovernanceResult<BountyProgram>;

    /// `None` when the program has no manager.
    async fn get_manager(&self, program: &ProgramName) -> GovernanceResult<Option<MemberActivity>>;

    async fn cast_reviewer_vote(
        &self,
        submission: &SubmissionId,
        reviewer: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<VoteCastReceipt>;

    async fn cast_manager_vote(
        &self,
        submission: &SubmissionId,
        manager: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<Submission>;

    /// Commit the terminal status once quorum is reached.
    async fn finalize_submission(
        &self,
        submission: &SubmissionId,
        manager: &WalletAddress,
    ) -> GovernanceResult<Submission>;

    async fn submission_status(
        &self,
        submission: &SubmissionId,
    ) -> GovernanceResult<SubmissionStatusView>;
}
