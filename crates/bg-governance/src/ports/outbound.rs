//! # Outbound Ports (Driven Side)
//!
//! Dependencies the governance service requires from its environment:
//!
//! - `DocumentStore` – versioned document storage with atomic batches
//! - `GovernanceEventSink` – post-commit event publication
//! - `AttachmentDirectory` – file metadata of a submission

use crate::domain::{BountyProgram, StoreError, Submission, UserMembership};
use crate::events::GovernanceEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{ProgramName, SubmissionId, Timestamp, WalletAddress};
use std::fmt;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Identity of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKey {
    Program(ProgramName),
    Membership(WalletAddress),
    Submission(SubmissionId),
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::Program(name) => write!(f, "programs/{}", name),
            DocumentKey::Membership(address) => write!(f, "users/{}", address),
            DocumentKey::Submission(id) => write!(f, "submissions/{}", id),
        }
    }
}

/// A document of one of the three record families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "data", rename_all = "snake_case")]
pub enum Document {
    Program(BountyProgram),
    Membership(UserMembership),
    Submission(Submission),
}

impl Document {
    pub fn key(&self) -> DocumentKey {
        match self {
            Document::Program(p) => DocumentKey::Program(p.name.clone()),
            Document::Membership(m) => DocumentKey::Membership(m.address.clone()),
            Document::Submission(s) => DocumentKey::Submission(s.id.clone()),
        }
    }
}

/// A loaded value and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            value: f(self.value),
            version: self.version,
        }
    }
}

/// Single operation in a write batch.
///
/// `expected_version: None` means the document must not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Write the document if its stored version still matches.
    Put {
        document: Document,
        expected_version: Option<u64>,
    },
    /// Read-set validation only; nothing is written.
    Guard {
        key: DocumentKey,
        expected_version: Option<u64>,
    },
}

impl WriteOp {
    pub fn key(&self) -> DocumentKey {
        match self {
            WriteOp::Put { document, .. } => document.key(),
            WriteOp::Guard { key, .. } => key.clone(),
        }
    }

    pub fn expected_version(&self) -> Option<u64> {
        match self {
            WriteOp::Put {
                expected_version, ..
            }
            | WriteOp::Guard {
                expected_version, ..
            } => *expected_version,
        }
    }
}

/// Operations applied all-or-nothing by `DocumentStore::commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, document: Document, expected_version: Option<u64>) {
        self.ops.push(WriteOp::Put {
            document,
            expected_version,
        });
    }

    pub fn guard(&mut self, key: DocumentKey, expected_version: Option<u64>) {
        self.ops.push(WriteOp::Guard {
            key,
            expected_version,
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Number of documents this batch writes.
    pub fn write_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, WriteOp::Put { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Versioned document storage.
///
/// The handle is constructed once at startup and passed in explicitly;
/// there is no process-wide connection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load_program(
        &self,
        name: &ProgramName,
    ) -> Result<Option<Versioned<BountyProgram>>, StoreError>;

    async fn load_membership(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Versioned<UserMembership>>, StoreError>;

    async fn load_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Versioned<Submission>>, StoreError>;

    /// Every submission reported against `program`, in creation order.
    async fn submissions_for_program(
        &self,
        program: &ProgramName,
    ) -> Result<Vec<Versioned<Submission>>, StoreError>;

    /// Validate every expected version and apply every put, or nothing.
    ///
    /// Fails with `StoreError::VersionConflict` when any expectation no
    /// longer holds.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Persist buffered state. Called once at shutdown.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Receives events after their transaction committed.
pub trait GovernanceEventSink: Send + Sync {
    fn publish(&self, event: GovernanceEvent) -> Result<(), String>;
}

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Metadata of a file uploaded with a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: Timestamp,
}

/// File-metadata collaborator.
#[async_trait]
pub trait AttachmentDirectory: Send + Sync {
    async fn attachments_for(&self, submission: &SubmissionId)
        -> Result<Vec<AttachmentMeta>, String>;
}
