//! # Domain Entities
//!
//! The three record families kept consistent by the Coordinator:
//!
//! - `BountyProgram` – Role Registry (reviewers + manager) and quorum policy
//! - `UserMembership` – Membership Index (reverse mapping per wallet)
//! - `Submission` – Vote Ledger and derived voting state
//!
//! All entities serialize in camelCase, which is also the shape returned by
//! the HTTP surface.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{ProgramName, SubmissionId, Timestamp, WalletAddress};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SEVERITY & VOTES
// =============================================================================

/// Finding severity a reviewer or manager may attach to an `accepted` vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive; clients send both `High` and `high`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .iter()
            .copied()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity: {}", s))
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The bare decision carried by a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Accepted,
    Rejected,
}

impl FromStr for VoteValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" => Ok(VoteValue::Accepted),
            "rejected" => Ok(VoteValue::Rejected),
            other => Err(format!("invalid vote value: {}", other)),
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteValue::Accepted => f.write_str("accepted"),
            VoteValue::Rejected => f.write_str("rejected"),
        }
    }
}

/// A vote. Severity only exists on the accepted branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "vote", rename_all = "snake_case")]
pub enum Vote {
    Accepted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

impl Vote {
    pub fn value(&self) -> VoteValue {
        match self {
            Vote::Accepted { .. } => VoteValue::Accepted,
            Vote::Rejected { .. } => VoteValue::Rejected,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Vote::Accepted { severity, .. } => *severity,
            Vote::Rejected { .. } => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Vote::Accepted { comment, .. } | Vote::Rejected { comment } => comment.as_deref(),
        }
    }

    /// Build a vote from loosely-typed request fields. A severity sent with
    /// a `rejected` vote is dropped.
    pub fn from_parts(value: VoteValue, severity: Option<Severity>, comment: Option<String>) -> Self {
        match value {
            VoteValue::Accepted => Vote::Accepted { severity, comment },
            VoteValue::Rejected => Vote::Rejected { comment },
        }
    }
}

/// One reviewer's entry in a submission's vote ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVoteEntry {
    pub reviewer_address: WalletAddress,
    #[serde(flatten)]
    pub vote: Vote,
    pub voted_at: Timestamp,
}

/// The manager's vote, independent of the reviewer quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerVote {
    pub manager_address: WalletAddress,
    #[serde(flatten)]
    pub vote: Vote,
    pub voted_at: Timestamp,
}

/// Consensus verdict produced by the Quorum Calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub vote: VoteValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

// =============================================================================
// QUORUM POLICY
// =============================================================================

/// How many agreeing votes a verdict needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuorumThreshold {
    /// Strictly more than half of the eligible panel.
    Majority,
    /// A fixed number of agreeing votes regardless of panel size.
    Fixed { votes: u32 },
}

impl QuorumThreshold {
    /// Agreeing votes required for a panel of `eligible` reviewers.
    pub fn required_votes(&self, eligible: usize) -> usize {
        match self {
            QuorumThreshold::Majority => eligible / 2 + 1,
            QuorumThreshold::Fixed { votes } => (*votes as usize).max(1),
        }
    }
}

impl Default for QuorumThreshold {
    fn default() -> Self {
        QuorumThreshold::Majority
    }
}

/// Per-program consensus configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuorumPolicy {
    pub threshold: QuorumThreshold,
    /// Accepted votes must carry a severity and the majority must agree on it.
    pub require_severity: bool,
}

// =============================================================================
// ROLE REGISTRY
// =============================================================================

/// A bounty program and its role registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyProgram {
    pub name: ProgramName,
    #[serde(default)]
    pub reviewer_addresses: BTreeSet<WalletAddress>,
    #[serde(default)]
    pub manager_address: Option<WalletAddress>,
    #[serde(default)]
    pub quorum: QuorumPolicy,
    #[serde(default = "default_severities")]
    pub allowed_severities: BTreeSet<Severity>,
}

fn default_severities() -> BTreeSet<Severity> {
    Severity::ALL.into_iter().collect()
}

impl BountyProgram {
    /// A program with no roles assigned, majority quorum and every severity
    /// allowed.
    pub fn new(name: ProgramName) -> Self {
        Self {
            name,
            reviewer_addresses: BTreeSet::new(),
            manager_address: None,
            quorum: QuorumPolicy::default(),
            allowed_severities: default_severities(),
        }
    }

    pub fn with_quorum(mut self, quorum: QuorumPolicy) -> Self {
        self.quorum = quorum;
        self
    }
}

// =============================================================================
// MEMBERSHIP INDEX
// =============================================================================

/// A program membership with its assignment date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub program: ProgramName,
    pub assigned_date: Timestamp,
}

/// Reverse mapping from a wallet to the programs it serves.
///
/// Created lazily on first assignment; never deleted, only emptied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMembership {
    pub address: WalletAddress,
    #[serde(default)]
    pub reviewer_of: Vec<RoleAssignment>,
    #[serde(default)]
    pub manager_of: Vec<RoleAssignment>,
}

// =============================================================================
// SUBMISSION / VOTE LEDGER
// =============================================================================

/// Externally visible lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Reviewing,
    Accepted,
    Rejected,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Accepted | SubmissionStatus::Rejected)
    }

    /// Still open for votes and role-change cascades.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionStatus::Pending | SubmissionStatus::Reviewing)
    }
}

impl From<VoteValue> for SubmissionStatus {
    fn from(value: VoteValue) -> Self {
        match value {
            VoteValue::Accepted => SubmissionStatus::Accepted,
            VoteValue::Rejected => SubmissionStatus::Rejected,
        }
    }
}

/// Internal consensus progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStatus {
    Pending,
    InReview,
    QuorumReached,
}

/// A finding reported against a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub program: ProgramName,
    pub status: SubmissionStatus,
    pub voting_status: VotingStatus,
    #[serde(default)]
    pub review_votes: Vec<ReviewVoteEntry>,
    #[serde(default)]
    pub manager_vote: Option<ManagerVote>,
    /// Last verdict reached by the reviewer panel.
    #[serde(default)]
    pub verdict: Option<Verdict>,
    pub created_at: Timestamp,
}

impl Submission {
    /// A freshly reported submission in `pending/pending`.
    pub fn new(id: SubmissionId, program: ProgramName, created_at: Timestamp) -> Self {
        Self {
            id,
            program,
            status: SubmissionStatus::Pending,
            voting_status: VotingStatus::Pending,
            review_votes: Vec::new(),
            manager_vote: None,
            verdict: None,
            created_at,
        }
    }

    pub fn vote_of(&self, reviewer: &WalletAddress) -> Option<&ReviewVoteEntry> {
        self.review_votes
            .iter()
            .find(|entry| &entry.reviewer_address == reviewer)
    }
}
