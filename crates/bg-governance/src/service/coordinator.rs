//! # Membership Transaction Coordinator
//!
//! Reviewer and manager changes spanning the Role Registry, the Membership
//! Index and the Vote Ledgers of in-flight submissions.
//!
//! Every in-flight submission of the program is tracked even when it is
//! left unchanged. Its version is then checked at commit, so a vote cast
//! concurrently under the old panel aborts this transaction rather than
//! surviving it.

use super::{GovernanceService, UnitOfWork};
use crate::domain::voting::recompute_after_panel_change;
use crate::domain::{
    BountyProgram, EntityKind, GovernanceError, GovernanceResult, VotingStatus,
};
use crate::events::GovernanceEvent;
use shared_types::{ProgramName, SubmissionId, WalletAddress};
use tracing::info;

impl GovernanceService {
    /// Load the program into `uow`; `NotFound` if it does not exist.
    async fn track_existing_program(
        &self,
        uow: &mut UnitOfWork,
        program: &ProgramName,
    ) -> GovernanceResult<()> {
        let loaded = self
            .store
            .load_program(program)
            .await?
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Program, program))?;
        uow.track_program(program, Some(loaded));
        Ok(())
    }

    async fn track_membership(
        &self,
        uow: &mut UnitOfWork,
        address: &WalletAddress,
    ) -> GovernanceResult<()> {
        let loaded = self.store.load_membership(address).await?;
        uow.track_membership(address, loaded);
        Ok(())
    }

    /// Track every pending/reviewing submission of the program.
    async fn track_in_flight(
        &self,
        uow: &mut UnitOfWork,
        program: &ProgramName,
    ) -> GovernanceResult<Vec<SubmissionId>> {
        let mut ids = Vec::new();
        for submission in self.store.submissions_for_program(program).await? {
            if submission.value.status.is_in_flight() {
                ids.push(submission.value.id.clone());
                uow.track_submission(submission);
            }
        }
        Ok(ids)
    }

    fn program_in<'a>(
        uow: &'a mut UnitOfWork,
        program: &ProgramName,
    ) -> GovernanceResult<&'a mut BountyProgram> {
        uow.program_mut(program)
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Program, program))
    }

    async fn commit(&self, uow: UnitOfWork) -> GovernanceResult<()> {
        self.store.commit(uow.into_batch()).await?;
        Ok(())
    }

    pub(super) async fn add_reviewer_tx(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        let mut uow = UnitOfWork::new();
        self.track_existing_program(&mut uow, program).await?;
        self.track_membership(&mut uow, address).await?;
        let in_flight = self.track_in_flight(&mut uow, program).await?;
        let now = self.now();

        Self::program_in(&mut uow, program)?.add_reviewer(address.clone())?;
        uow.membership_or_create(address)
            .assign_reviewer(program, now);

        // The denominator changed: consensus that had not been reached must
        // be recomputed from scratch.
        let mut reset = 0;
        for id in &in_flight {
            if let Some(submission) = uow.submission_mut(id) {
                if submission.voting_status == VotingStatus::InReview {
                    submission.voting_status = VotingStatus::Pending;
                    reset += 1;
                }
            }
        }

        let updated = Self::program_in(&mut uow, program)?.clone();
        self.commit(uow).await?;

        info!(
            program = %program,
            address = %address,
            reset_submissions = reset,
            "Reviewer added"
        );
        self.publish(vec![GovernanceEvent::ReviewerAdded {
            program: program.clone(),
            address: address.clone(),
            reset_submissions: reset,
            at: now,
        }]);
        Ok(updated)
    }

    pub(super) async fn remove_reviewer_tx(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        let mut uow = UnitOfWork::new();
        self.track_existing_program(&mut uow, program).await?;
        self.track_membership(&mut uow, address).await?;
        let in_flight = self.track_in_flight(&mut uow, program).await?;
        let now = self.now();

        Self::program_in(&mut uow, program)?.remove_reviewer(address)?;
        if let Some(membership) = uow.membership_mut(address) {
            membership.revoke_reviewer(program);
        }

        let panel = Self::program_in(&mut uow, program)?.clone();
        let mut votes_removed = 0;
        for id in &in_flight {
            if let Some(submission) = uow.submission_mut(id) {
                let before = submission.review_votes.len();
                submission
                    .review_votes
                    .retain(|entry| &entry.reviewer_address != address);
                votes_removed += before - submission.review_votes.len();
                recompute_after_panel_change(submission, &panel);
            }
        }

        self.commit(uow).await?;

        info!(
            program = %program,
            address = %address,
            votes_removed,
            "Reviewer removed"
        );
        self.publish(vec![GovernanceEvent::ReviewerRemoved {
            program: program.clone(),
            address: address.clone(),
            votes_removed,
            at: now,
        }]);
        Ok(panel)
    }

    /// Assign (`Some`) or clear (`None`) the manager.
    ///
    /// With `require_current`, a program without a manager fails with
    /// `NotFound` (change/remove); without it the slot is simply
    /// overwritten (add).
    pub(super) async fn reassign_manager_tx(
        &self,
        program: &ProgramName,
        new_manager: Option<&WalletAddress>,
        require_current: bool,
    ) -> GovernanceResult<BountyProgram> {
        let mut uow = UnitOfWork::new();
        self.track_existing_program(&mut uow, program).await?;

        let current = Self::program_in(&mut uow, program)?.manager_address.clone();
        if require_current && current.is_none() {
            return Err(GovernanceError::not_found(EntityKind::Manager, program));
        }

        if let Some(old) = &current {
            self.track_membership(&mut uow, old).await?;
        }
        if let Some(new) = new_manager {
            self.track_membership(&mut uow, new).await?;
        }
        let in_flight = self.track_in_flight(&mut uow, program).await?;
        let now = self.now();

        let previous = match new_manager {
            Some(new) => {
                let previous = Self::program_in(&mut uow, program)?.set_manager(new.clone())?;
                uow.membership_or_create(new).assign_manager(program, now);
                previous
            }
            None => Some(Self::program_in(&mut uow, program)?.clear_manager()?),
        };

        if let Some(old) = &previous {
            if let Some(membership) = uow.membership_mut(old) {
                membership.revoke_manager(program);
            }
        }

        // A new manager must not inherit the predecessor's judgment.
        let mut votes_cleared = 0;
        for id in &in_flight {
            if let Some(submission) = uow.submission_mut(id) {
                if submission.manager_vote.take().is_some() {
                    votes_cleared += 1;
                }
            }
        }

        let updated = Self::program_in(&mut uow, program)?.clone();
        let event = match (new_manager, previous) {
            (Some(new), previous) => GovernanceEvent::ManagerAssigned {
                program: program.clone(),
                address: new.clone(),
                previous,
                votes_cleared,
                at: now,
            },
            (None, previous) => GovernanceEvent::ManagerRemoved {
                program: program.clone(),
                address: previous
                    .ok_or_else(|| GovernanceError::not_found(EntityKind::Manager, program))?,
                votes_cleared,
                at: now,
            },
        };
        self.commit(uow).await?;

        info!(
            program = %program,
            event = event.name(),
            manager = ?updated.manager_address.as_ref().map(|m| m.as_str()),
            votes_cleared,
            "Manager slot updated"
        );
        self.publish(vec![event]);
        Ok(updated)
    }
}
