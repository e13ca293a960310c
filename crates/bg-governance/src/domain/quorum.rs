//! # Quorum Calculator
//!
//! Pure function from (eligible reviewer set, vote ledger, policy) to a
//! consensus outcome.
//!
//! ## Rule
//!
//! - Only votes cast by currently eligible reviewers count.
//! - A vote value wins once its count reaches `policy.threshold` for the
//!   size of the eligible panel (majority: `n/2 + 1`).
//! - With `require_severity`, an accepted verdict additionally needs that
//!   many accepted votes sharing one severity.
//! - If both values reach a (fixed, sub-majority) threshold, the larger
//!   count wins; a tie yields no quorum.

use super::entities::{QuorumPolicy, ReviewVoteEntry, Severity, Verdict, VoteValue};
use serde::Serialize;
use shared_types::WalletAddress;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of a quorum evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuorumOutcome {
    NoQuorum,
    QuorumReached { verdict: Verdict },
}

impl QuorumOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, QuorumOutcome::QuorumReached { .. })
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            QuorumOutcome::QuorumReached { verdict } => Some(*verdict),
            QuorumOutcome::NoQuorum => None,
        }
    }
}

/// Vote counts over the eligible panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub eligible_reviewers: usize,
    pub required_votes: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Votes in the ledger from addresses no longer on the panel.
    pub ignored: usize,
    #[serde(skip)]
    pub accepted_by_severity: BTreeMap<Severity, usize>,
}

/// Count the eligible votes in a ledger.
pub fn tally(
    policy: &QuorumPolicy,
    eligible: &BTreeSet<WalletAddress>,
    votes: &[ReviewVoteEntry],
) -> VoteTally {
    let mut tally = VoteTally {
        eligible_reviewers: eligible.len(),
        required_votes: policy.threshold.required_votes(eligible.len()),
        ..VoteTally::default()
    };

    for entry in votes {
        if !eligible.contains(&entry.reviewer_address) {
            tally.ignored += 1;
            continue;
        }
        match entry.vote.value() {
            VoteValue::Accepted => {
                tally.accepted += 1;
                if let Some(severity) = entry.vote.severity() {
                    *tally.accepted_by_severity.entry(severity).or_insert(0) += 1;
                }
            }
            VoteValue::Rejected => tally.rejected += 1,
        }
    }
    tally
}

/// Evaluate consensus for a submission's ledger.
pub fn evaluate(
    policy: &QuorumPolicy,
    eligible: &BTreeSet<WalletAddress>,
    votes: &[ReviewVoteEntry],
) -> QuorumOutcome {
    outcome_of(policy, &tally(policy, eligible, votes))
}

/// Derive the outcome from an already computed tally.
pub fn outcome_of(policy: &QuorumPolicy, tally: &VoteTally) -> QuorumOutcome {
    // An empty panel can never reach quorum, whatever the threshold says.
    if tally.eligible_reviewers == 0 {
        return QuorumOutcome::NoQuorum;
    }
    let required = tally.required_votes;

    let accepted = accepted_verdict(policy, tally);
    let rejected = (tally.rejected >= required).then_some(Verdict {
        vote: VoteValue::Rejected,
        severity: None,
    });

    let verdict = match (accepted, rejected) {
        (Some(a), Some(r)) => match tally.accepted.cmp(&tally.rejected) {
            std::cmp::Ordering::Greater => Some(a),
            std::cmp::Ordering::Less => Some(r),
            std::cmp::Ordering::Equal => None,
        },
        (a, r) => a.or(r),
    };

    match verdict {
        Some(verdict) => QuorumOutcome::QuorumReached { verdict },
        None => QuorumOutcome::NoQuorum,
    }
}

fn accepted_verdict(policy: &QuorumPolicy, tally: &VoteTally) -> Option<Verdict> {
    let required = tally.required_votes;
    if tally.accepted < required {
        return None;
    }

    // Most common severity; ties resolve to the more severe level.
    let leading = tally
        .accepted_by_severity
        .iter()
        .max_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then(sb.cmp(sa)))
        .filter(|(_, count)| **count >= required)
        .map(|(severity, _)| *severity);

    if policy.require_severity && leading.is_none() {
        return None;
    }

    Some(Verdict {
        vote: VoteValue::Accepted,
        severity: leading,
    })
}
