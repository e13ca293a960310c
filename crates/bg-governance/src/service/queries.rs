//! Read-only views. No locking; derived counts may lag a concurrent write.

use super::GovernanceService;
use crate::domain::voting as machine;
use crate::domain::{BountyProgram, EntityKind, GovernanceError, GovernanceResult, Submission};
use crate::ports::{MemberActivity, SubmissionStatusView};
use shared_types::{ProgramName, SubmissionId, Timestamp, WalletAddress};

/// Per-member vote statistics over a program's submissions.
///
/// `vote_at` returns when the member voted on a submission, if they did.
fn activity<F>(
    address: &WalletAddress,
    assigned_date: Option<Timestamp>,
    submissions: &[Submission],
    vote_at: F,
) -> MemberActivity
where
    F: Fn(&Submission) -> Option<Timestamp>,
{
    let mut reviewed = 0;
    let mut pending = 0;
    let mut last_active: Option<Timestamp> = None;

    for submission in submissions {
        match vote_at(submission) {
            Some(at) => {
                reviewed += 1;
                last_active = Some(last_active.map_or(at, |prev| prev.max(at)));
            }
            None if submission.status.is_in_flight() => pending += 1,
            None => {}
        }
    }

    MemberActivity {
        address: address.clone(),
        assigned_date,
        reviewed_submissions: reviewed,
        pending_submissions: pending,
        last_active,
    }
}

impl GovernanceService {
    async fn require_program(&self, name: &ProgramName) -> GovernanceResult<BountyProgram> {
        self.store
            .load_program(name)
            .await?
            .map(|p| p.value)
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Program, name))
    }

    async fn program_submissions(&self, name: &ProgramName) -> GovernanceResult<Vec<Submission>> {
        Ok(self
            .store
            .submissions_for_program(name)
            .await?
            .into_iter()
            .map(|s| s.value)
            .collect())
    }

    pub(super) async fn reviewer_activity(
        &self,
        name: &ProgramName,
    ) -> GovernanceResult<Vec<MemberActivity>> {
        let program = self.require_program(name).await?;
        let submissions = self.program_submissions(name).await?;

        let mut reviewers = Vec::with_capacity(program.reviewer_addresses.len());
        for address in &program.reviewer_addresses {
            let assigned = self
                .store
                .load_membership(address)
                .await?
                .and_then(|m| m.value.reviewer_since(name));
            reviewers.push(activity(address, assigned, &submissions, |s| {
                s.vote_of(address).map(|entry| entry.voted_at)
            }));
        }
        Ok(reviewers)
    }

    pub(super) async fn manager_activity(
        &self,
        name: &ProgramName,
    ) -> GovernanceResult<Option<MemberActivity>> {
        let program = self.require_program(name).await?;
        let Some(manager) = program.manager_address else {
            return Ok(None);
        };

        let submissions = self.program_submissions(name).await?;
        let assigned = self
            .store
            .load_membership(&manager)
            .await?
            .and_then(|m| m.value.manager_since(name));

        Ok(Some(activity(&manager, assigned, &submissions, |s| {
            s.manager_vote
                .as_ref()
                .filter(|mv| mv.manager_address == manager)
                .map(|mv| mv.voted_at)
        })))
    }

    pub(super) async fn status_view(
        &self,
        id: &SubmissionId,
    ) -> GovernanceResult<SubmissionStatusView> {
        let submission = self
            .store
            .load_submission(id)
            .await?
            .map(|s| s.value)
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Submission, id))?;
        let program = self.require_program(&submission.program).await?;

        Ok(SubmissionStatusView {
            submission_id: submission.id.clone(),
            program: submission.program.clone(),
            status: submission.status,
            voting_status: submission.voting_status,
            verdict: submission.verdict,
            vote_summary: machine::summarize(&submission, &program),
            can_finalize: machine::can_finalize(&submission),
            manager_vote: submission.manager_vote,
        })
    }
}
