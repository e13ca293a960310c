//! # Bounty Governance Core
//!
//! Membership and voting for bug-bounty programs: who may review and manage
//! a program, how reviewer votes on a submission add up to a verdict, and
//! how role changes cascade into in-flight votes.
//!
//! ## Record Families
//!
//! ```text
//!  BountyProgram ─────reviewerAddresses/managerAddress────┐
//!  (Role Registry)                                        │ kept in step by
//!                                                         │ the Coordinator
//!  UserMembership ────reviewerOf/managerOf────────────────┤ (one atomic
//!  (Membership Index)                                     │  batch each)
//!                                                         │
//!  Submission ────────reviewVotes/managerVote/status──────┘
//!  (Vote Ledger)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Bidirectional Membership | `A ∈ P.reviewerAddresses ⇔ P ∈ A.reviewerOf` (same for manager) |
//! | 2 | Atomic Governance | A failed operation leaves all three families unchanged |
//! | 3 | One Vote per Reviewer | Re-votes replace the ledger entry |
//! | 4 | Eligible Votes Only | Only the current panel's votes count toward quorum |
//! | 5 | Sticky Quorum | Vote casts never move `quorum_reached` back to `in_review` |
//! | 6 | Terminal Status | No votes after `accepted`/`rejected` |
//! | 7 | No Inherited Judgment | Manager changes clear in-flight manager votes |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities and pure rules (registry, membership, quorum, voting)
//! - `ports/` - Inbound API and outbound document store / event / attachment SPIs
//! - `adapters/` - In-memory and file-backed stores, event bus, attachments
//! - `service/` - Transactions: coordinator, vote casts, queries
//!
//! ## Usage
//!
//! ```ignore
//! use bg_governance::*;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! store.seed_program(BountyProgram::new(ProgramName::parse("Acme")?));
//!
//! let service = GovernanceService::new(GovernanceDependencies {
//!     store,
//!     events: Arc::new(InMemoryEventSink::new()),
//!     attachments: Arc::new(InMemoryAttachmentDirectory::new()),
//!     config: GovernanceConfig::default(),
//! });
//!
//! service.add_reviewer(&acme, &reviewer).await?;
//! let receipt = service.cast_reviewer_vote(&id, &reviewer, vote).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{
    BroadcastEventBus, DocumentTable, FileBackedDocumentStore, InMemoryAttachmentDirectory,
    InMemoryDocumentStore, InMemoryEventSink,
};
pub use domain::{
    BountyProgram, EntityKind, ErrorKind, GovernanceError, GovernanceResult, ManagerVote,
    QuorumOutcome, QuorumPolicy, QuorumThreshold, ReviewVoteEntry, RoleAssignment, Severity,
    StoreError, Submission, SubmissionStatus, UserMembership, Verdict, Vote, VoteSummary,
    VoteTally, VoteValue, VotingStatus,
};
pub use events::GovernanceEvent;
pub use metrics::{GovernanceMetrics, GovernanceMetricsSnapshot};
pub use ports::{
    AttachmentDirectory, AttachmentMeta, Document, DocumentKey, DocumentStore, GovernanceApi,
    GovernanceEventSink, MemberActivity, SubmissionStatusView, Versioned, VoteCastReceipt,
    WriteBatch, WriteOp,
};
pub use service::{GovernanceConfig, GovernanceDependencies, GovernanceService, UnitOfWork};

pub use shared_types::{ProgramName, SubmissionId, WalletAddress};
