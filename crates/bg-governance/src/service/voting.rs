//! Vote casts and finalization as optimistic transactions.
//!
//! Each attempt reads the submission and its program, applies the state
//! machine, and commits a put of the submission guarded by the program's
//! version. A version conflict means another writer got there first; the
//! attempt is thrown away and the whole read-modify-write runs again.

use super::{GovernanceService, TxError, UnitOfWork};
use crate::domain::voting::{self as machine, VoteTransition};
use crate::domain::{
    BountyProgram, EntityKind, GovernanceError, GovernanceResult, Submission, SubmissionStatus,
    Vote, VotingStatus,
};
use crate::events::GovernanceEvent;
use crate::ports::{AttachmentMeta, VoteCastReceipt};
use rand::Rng;
use shared_types::{SubmissionId, WalletAddress};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

impl GovernanceService {
    /// Load a submission and its program into a fresh unit of work.
    async fn open_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<(UnitOfWork, Submission, BountyProgram), TxError> {
        let submission = self
            .store
            .load_submission(id)
            .await?
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Submission, id))?;
        let program_name = submission.value.program.clone();
        let program = self
            .store
            .load_program(&program_name)
            .await?
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Program, &program_name))?;

        let current = submission.value.clone();
        let panel = program.value.clone();
        let mut uow = UnitOfWork::new();
        uow.track_submission(submission);
        uow.track_program(&program_name, Some(program));
        Ok((uow, current, panel))
    }

    async fn commit_submission(
        &self,
        mut uow: UnitOfWork,
        updated: &Submission,
    ) -> Result<(), TxError> {
        if let Some(slot) = uow.submission_mut(&updated.id) {
            *slot = updated.clone();
        }
        self.store.commit(uow.into_batch()).await?;
        Ok(())
    }

    /// Retry `attempt` on version conflicts with jittered backoff.
    async fn with_conflict_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> GovernanceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TxError>>,
    {
        let max_retries = self.config.max_vote_retries;
        let mut retries = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(TxError::Store(err)) if err.is_conflict() && retries < max_retries => {
                    retries += 1;
                    self.metrics.record_vote_retry();
                    let delay = self.backoff(retries);
                    debug!(operation, retries, ?delay, error = %err, "Version conflict, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(TxError::Store(err)) if err.is_conflict() => {
                    return Err(GovernanceError::abort(format!(
                        "{} gave up after {} retries: {}",
                        operation, retries, err
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn backoff(&self, retry: u32) -> Duration {
        let base = self.config.retry_backoff;
        let base_ms = base.as_millis() as u64;
        let jitter_ms = if base_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=base_ms)
        };
        base.saturating_mul(retry) + Duration::from_millis(jitter_ms)
    }

    /// Attachment metadata for a receipt. Runs after the vote has committed,
    /// so failures and slow lookups only degrade to an empty list.
    pub(super) async fn attachments_or_empty(&self, id: &SubmissionId) -> Vec<AttachmentMeta> {
        let lookup = self.attachments.attachments_for(id);
        match tokio::time::timeout(self.config.attachment_timeout, lookup).await {
            Ok(Ok(files)) => files,
            Ok(Err(err)) => {
                warn!(submission = %id, error = %err, "Attachment lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    submission = %id,
                    timeout = ?self.config.attachment_timeout,
                    "Attachment lookup timed out"
                );
                Vec::new()
            }
        }
    }

    pub(super) async fn cast_reviewer_vote_with_retry(
        &self,
        id: &SubmissionId,
        reviewer: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<VoteCastReceipt> {
        let vote_value = vote.value();
        let (submission, program, transition) = self
            .with_conflict_retry("cast_reviewer_vote", move || {
                self.try_cast_reviewer_vote(id, reviewer, vote.clone())
            })
            .await?;

        self.metrics.record_vote(transition.quorum_newly_reached);
        let now = submission
            .vote_of(reviewer)
            .map(|entry| entry.voted_at)
            .unwrap_or_else(|| self.now());
        info!(
            submission = %id,
            program = %program.name,
            reviewer = %reviewer,
            vote = %vote_value,
            voting_status = ?submission.voting_status,
            "Reviewer vote cast"
        );

        let mut events = vec![GovernanceEvent::ReviewerVoteCast {
            submission: id.clone(),
            program: program.name.clone(),
            reviewer: reviewer.clone(),
            vote: vote_value,
            replaced: transition.replaced,
            at: now,
        }];
        if transition.quorum_newly_reached {
            if let Some(verdict) = transition.outcome.verdict() {
                events.push(GovernanceEvent::QuorumReached {
                    submission: id.clone(),
                    program: program.name.clone(),
                    verdict,
                    at: now,
                });
            }
        }
        self.publish(events);

        Ok(VoteCastReceipt {
            vote_summary: machine::summarize(&submission, &program),
            quorum_reached: submission.voting_status == VotingStatus::QuorumReached,
            submission,
            attachments: Vec::new(),
        })
    }

    async fn try_cast_reviewer_vote(
        &self,
        id: &SubmissionId,
        reviewer: &WalletAddress,
        vote: Vote,
    ) -> Result<(Submission, BountyProgram, VoteTransition), TxError> {
        let (uow, mut submission, program) = self.open_submission(id).await?;
        let transition =
            machine::cast_reviewer_vote(&mut submission, &program, reviewer, vote, self.now())?;
        self.commit_submission(uow, &submission).await?;
        Ok((submission, program, transition))
    }

    pub(super) async fn cast_manager_vote_with_retry(
        &self,
        id: &SubmissionId,
        manager: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<Submission> {
        let vote_value = vote.value();
        let submission = self
            .with_conflict_retry("cast_manager_vote", move || {
                let vote = vote.clone();
                async move {
                    let (uow, mut submission, program) = self.open_submission(id).await?;
                    machine::cast_manager_vote(
                        &mut submission,
                        &program,
                        manager,
                        vote,
                        self.now(),
                    )?;
                    self.commit_submission(uow, &submission).await?;
                    Ok(submission)
                }
            })
            .await?;

        info!(submission = %id, manager = %manager, vote = %vote_value, "Manager vote cast");
        self.publish(vec![GovernanceEvent::ManagerVoteCast {
            submission: id.clone(),
            program: submission.program.clone(),
            manager: manager.clone(),
            vote: vote_value,
            at: self.now(),
        }]);
        Ok(submission)
    }

    pub(super) async fn finalize_tx(
        &self,
        id: &SubmissionId,
        manager: &WalletAddress,
    ) -> GovernanceResult<Submission> {
        let (uow, mut submission, program) = self.open_submission(id).await?;
        let status: SubmissionStatus = machine::finalize(&mut submission, &program, manager)?;
        self.commit_submission(uow, &submission).await?;

        self.metrics.record_finalized();
        info!(submission = %id, manager = %manager, status = ?status, "Submission finalized");
        self.publish(vec![GovernanceEvent::SubmissionFinalized {
            submission: id.clone(),
            program: program.name.clone(),
            status,
            finalized_by: manager.clone(),
            at: self.now(),
        }]);
        Ok(submission)
    }
}
