//! # Voting State Machine
//!
//! Submission lifecycle driven by individual vote casts.
//!
//! ```text
//! pending/pending ──first vote──→ reviewing/in_review ──verdict──→ reviewing/quorum_reached
//!                                                                        │
//!                                                        manager finalize│
//!                                                                        ↓
//!                                                     {accepted|rejected}/quorum_reached
//! ```
//!
//! Under a fixed panel `quorum_reached` is sticky: re-votes never move it
//! back to `in_review`. Only role changes (see
//! [`recompute_after_panel_change`]) may.

use super::entities::{
    BountyProgram, ManagerVote, ReviewVoteEntry, Submission, SubmissionStatus, Verdict, Vote,
    VotingStatus,
};
use super::errors::{GovernanceError, GovernanceResult};
use super::quorum::{self, QuorumOutcome, VoteTally};
use serde::Serialize;
use shared_types::{Timestamp, WalletAddress};

/// What a reviewer vote cast did to the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTransition {
    /// The vote replaced an earlier vote by the same reviewer.
    pub replaced: bool,
    /// `status` moved `pending → reviewing`.
    pub review_started: bool,
    /// `voting_status` moved into `quorum_reached` with this vote.
    pub quorum_newly_reached: bool,
    pub outcome: QuorumOutcome,
}

/// Vote counts and verdict reported alongside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    #[serde(flatten)]
    pub tally: VoteTally,
    pub total_votes: usize,
    pub voting_status: VotingStatus,
    pub verdict: Option<Verdict>,
    pub can_finalize: bool,
}

/// Check a vote against the program's severity rules.
pub fn validate_vote(program: &BountyProgram, vote: &Vote) -> GovernanceResult<()> {
    if let Vote::Accepted { severity, .. } = vote {
        match severity {
            Some(severity) if !program.allowed_severities.contains(severity) => {
                return Err(GovernanceError::InvalidState(format!(
                    "severity {} is not allowed by program {}",
                    severity, program.name
                )));
            }
            None if program.quorum.require_severity => {
                return Err(GovernanceError::InvalidState(format!(
                    "program {} requires a severity on accepted votes",
                    program.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn ensure_open(submission: &Submission) -> GovernanceResult<()> {
    if submission.status.is_terminal() {
        return Err(GovernanceError::InvalidState(format!(
            "submission {} is already {:?}",
            submission.id, submission.status
        )));
    }
    Ok(())
}

/// Apply a reviewer vote: authorize, validate, upsert the ledger entry and
/// advance the combined status.
pub fn cast_reviewer_vote(
    submission: &mut Submission,
    program: &BountyProgram,
    reviewer: &WalletAddress,
    vote: Vote,
    at: Timestamp,
) -> GovernanceResult<VoteTransition> {
    if !program.is_reviewer(reviewer) {
        return Err(GovernanceError::Unauthorized {
            address: reviewer.clone(),
            action: "cast a reviewer vote",
        });
    }
    ensure_open(submission)?;
    validate_vote(program, &vote)?;

    let entry = ReviewVoteEntry {
        reviewer_address: reviewer.clone(),
        vote,
        voted_at: at,
    };
    let replaced = match submission
        .review_votes
        .iter_mut()
        .find(|e| &e.reviewer_address == reviewer)
    {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            submission.review_votes.push(entry);
            false
        }
    };

    let review_started = submission.status == SubmissionStatus::Pending;
    if review_started {
        submission.status = SubmissionStatus::Reviewing;
    }

    let outcome = quorum::evaluate(
        &program.quorum,
        &program.reviewer_addresses,
        &submission.review_votes,
    );
    let was_reached = submission.voting_status == VotingStatus::QuorumReached;

    if let Some(verdict) = outcome.verdict() {
        submission.verdict = Some(verdict);
        submission.voting_status = VotingStatus::QuorumReached;
    } else if !was_reached {
        submission.voting_status = VotingStatus::InReview;
    }

    Ok(VoteTransition {
        replaced,
        review_started,
        quorum_newly_reached: !was_reached && outcome.is_reached(),
        outcome,
    })
}

/// Recompute voting state after the eligible panel changed.
///
/// Unlike a vote cast this may leave `quorum_reached`: with no votes left
/// the submission goes back to `pending`, otherwise to whatever the current
/// panel supports.
pub fn recompute_after_panel_change(submission: &mut Submission, program: &BountyProgram) {
    if submission.review_votes.is_empty() {
        submission.voting_status = VotingStatus::Pending;
        submission.verdict = None;
        return;
    }
    match quorum::evaluate(
        &program.quorum,
        &program.reviewer_addresses,
        &submission.review_votes,
    ) {
        QuorumOutcome::QuorumReached { verdict } => {
            submission.voting_status = VotingStatus::QuorumReached;
            submission.verdict = Some(verdict);
        }
        QuorumOutcome::NoQuorum => {
            submission.voting_status = VotingStatus::InReview;
            submission.verdict = None;
        }
    }
}

/// Precondition for the manager's terminal transition.
pub fn can_finalize(submission: &Submission) -> bool {
    submission.voting_status == VotingStatus::QuorumReached && !submission.status.is_terminal()
}

/// Record (or replace) the manager's vote.
pub fn cast_manager_vote(
    submission: &mut Submission,
    program: &BountyProgram,
    manager: &WalletAddress,
    vote: Vote,
    at: Timestamp,
) -> GovernanceResult<()> {
    if !program.is_manager(manager) {
        return Err(GovernanceError::Unauthorized {
            address: manager.clone(),
            action: "cast a manager vote",
        });
    }
    ensure_open(submission)?;
    validate_vote(program, &vote)?;

    submission.manager_vote = Some(ManagerVote {
        manager_address: manager.clone(),
        vote,
        voted_at: at,
    });
    Ok(())
}

/// Commit the terminal status. The manager's own vote wins over the panel
/// verdict when present.
pub fn finalize(
    submission: &mut Submission,
    program: &BountyProgram,
    manager: &WalletAddress,
) -> GovernanceResult<SubmissionStatus> {
    if !program.is_manager(manager) {
        return Err(GovernanceError::Unauthorized {
            address: manager.clone(),
            action: "finalize a submission",
        });
    }
    if !can_finalize(submission) {
        return Err(GovernanceError::InvalidState(format!(
            "submission {} cannot be finalized from {:?}/{:?}",
            submission.id, submission.status, submission.voting_status
        )));
    }

    let decision = submission
        .manager_vote
        .as_ref()
        .map(|mv| mv.vote.value())
        .or_else(|| submission.verdict.map(|v| v.vote))
        .ok_or_else(|| {
            GovernanceError::InvalidState(format!(
                "submission {} has no verdict to finalize",
                submission.id
            ))
        })?;

    submission.status = decision.into();
    Ok(submission.status)
}

/// Summarize the ledger against the program's current panel.
pub fn summarize(submission: &Submission, program: &BountyProgram) -> VoteSummary {
    VoteSummary {
        tally: quorum::tally(
            &program.quorum,
            &program.reviewer_addresses,
            &submission.review_votes,
        ),
        total_votes: submission.review_votes.len(),
        voting_status: submission.voting_status,
        verdict: submission.verdict,
        can_finalize: can_finalize(submission),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{QuorumPolicy, QuorumThreshold, Severity, VoteValue};
    use crate::domain::ErrorKind;
    use chrono::Utc;
    use shared_types::{ProgramName, SubmissionId};

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::parse(s).unwrap()
    }

    fn acme(reviewers: &[&str]) -> BountyProgram {
        let mut p = BountyProgram::new(ProgramName::parse("Acme").unwrap()).with_quorum(
            QuorumPolicy {
                threshold: QuorumThreshold::Majority,
                require_severity: true,
            },
        );
        for r in reviewers {
            p.add_reviewer(addr(r)).unwrap();
        }
        p
    }

    fn submission() -> Submission {
        Submission::new(
            SubmissionId::generate(),
            ProgramName::parse("Acme").unwrap(),
            Utc::now(),
        )
    }

    fn high() -> Vote {
        Vote::Accepted {
            severity: Some(Severity::High),
            comment: None,
        }
    }

    #[test]
    fn test_first_vote_starts_review() {
        let program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();

        let t = cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        assert!(t.review_started);
        assert!(!t.replaced);
        assert_eq!(s.status, SubmissionStatus::Reviewing);
        assert_eq!(s.voting_status, VotingStatus::InReview);
    }

    #[test]
    fn test_second_agreeing_vote_reaches_quorum() {
        let program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        let t = cast_reviewer_vote(&mut s, &program, &addr("0xb"), high(), Utc::now()).unwrap();

        assert!(t.quorum_newly_reached);
        assert_eq!(s.voting_status, VotingStatus::QuorumReached);
        assert!(can_finalize(&s));
    }

    #[test]
    fn test_revote_replaces_entry() {
        let program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        let t = cast_reviewer_vote(
            &mut s,
            &program,
            &addr("0xA"),
            Vote::Rejected { comment: None },
            Utc::now(),
        )
        .unwrap();

        assert!(t.replaced);
        assert_eq!(s.review_votes.len(), 1);
        assert_eq!(s.review_votes[0].vote.value(), VoteValue::Rejected);
    }

    #[test]
    fn test_quorum_is_sticky_under_revote() {
        let program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        cast_reviewer_vote(&mut s, &program, &addr("0xb"), high(), Utc::now()).unwrap();

        cast_reviewer_vote(
            &mut s,
            &program,
            &addr("0xb"),
            Vote::Rejected { comment: None },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(s.voting_status, VotingStatus::QuorumReached);
        assert_eq!(s.verdict.map(|v| v.vote), Some(VoteValue::Accepted));
    }

    #[test]
    fn test_non_reviewer_unauthorized() {
        let program = acme(&["0xa"]);
        let mut s = submission();
        let err = cast_reviewer_vote(&mut s, &program, &addr("0xz"), high(), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(s.review_votes.is_empty());
    }

    #[test]
    fn test_missing_or_disallowed_severity_is_invalid() {
        let mut program = acme(&["0xa"]);
        let mut s = submission();
        let err = cast_reviewer_vote(
            &mut s,
            &program,
            &addr("0xa"),
            Vote::Accepted {
                severity: None,
                comment: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        program.allowed_severities.remove(&Severity::High);
        let err = cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_terminal_submission_rejects_votes() {
        let program = acme(&["0xa"]);
        let mut s = submission();
        s.status = SubmissionStatus::Accepted;
        let err = cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_recompute_after_panel_change() {
        let mut program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        cast_reviewer_vote(&mut s, &program, &addr("0xb"), high(), Utc::now()).unwrap();

        program.remove_reviewer(&addr("0xb")).unwrap();
        s.review_votes.retain(|e| e.reviewer_address != addr("0xb"));
        recompute_after_panel_change(&mut s, &program);
        assert_eq!(s.voting_status, VotingStatus::InReview);
        assert!(s.verdict.is_none());

        s.review_votes.clear();
        recompute_after_panel_change(&mut s, &program);
        assert_eq!(s.voting_status, VotingStatus::Pending);
    }

    #[test]
    fn test_finalize_requires_manager_and_quorum() {
        let mut program = acme(&["0xa"]);
        program.set_manager(addr("0xm")).unwrap();
        let mut s = submission();

        let err = finalize(&mut s, &program, &addr("0xm")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        let err = finalize(&mut s, &program, &addr("0xa")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        assert_eq!(
            finalize(&mut s, &program, &addr("0xm")).unwrap(),
            SubmissionStatus::Accepted
        );
        assert!(!can_finalize(&s));
    }

    #[test]
    fn test_manager_vote_overrides_verdict_on_finalize() {
        let mut program = acme(&["0xa"]);
        program.set_manager(addr("0xm")).unwrap();
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        cast_manager_vote(
            &mut s,
            &program,
            &addr("0xm"),
            Vote::Rejected { comment: None },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(
            finalize(&mut s, &program, &addr("0xm")).unwrap(),
            SubmissionStatus::Rejected
        );
    }

    #[test]
    fn test_summary_counts() {
        let program = acme(&["0xa", "0xb", "0xc"]);
        let mut s = submission();
        cast_reviewer_vote(&mut s, &program, &addr("0xa"), high(), Utc::now()).unwrap();
        cast_reviewer_vote(
            &mut s,
            &program,
            &addr("0xc"),
            Vote::Rejected { comment: None },
            Utc::now(),
        )
        .unwrap();

        let summary = summarize(&s, &program);
        assert_eq!(summary.tally.accepted, 1);
        assert_eq!(summary.tally.rejected, 1);
        assert_eq!(summary.tally.required_votes, 2);
        assert_eq!(summary.total_votes, 2);
        assert!(!summary.can_finalize);
    }
}
