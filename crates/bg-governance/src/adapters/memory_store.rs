//! # In-Memory Document Store
//!
//! `DocumentTable` holds the versioned documents and implements the batch
//! validation shared by every store adapter. `InMemoryDocumentStore` wraps
//! it in a lock for tests and development nodes.

use crate::domain::{BountyProgram, StoreError, Submission, UserMembership};
use crate::ports::{Document, DocumentKey, DocumentStore, Versioned, WriteBatch, WriteOp};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{ProgramName, SubmissionId, WalletAddress};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Versioned documents keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTable {
    docs: BTreeMap<DocumentKey, Versioned<Document>>,
}

/// On-disk shape of a table.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TableImage {
    pub documents: Vec<Versioned<Document>>,
}

impl DocumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&Versioned<Document>> {
        self.docs.get(key)
    }

    pub fn version_of(&self, key: &DocumentKey) -> Option<u64> {
        self.docs.get(key).map(|d| d.version)
    }

    pub fn program(&self, name: &ProgramName) -> Option<Versioned<BountyProgram>> {
        match self.docs.get(&DocumentKey::Program(name.clone())) {
            Some(Versioned {
                value: Document::Program(p),
                version,
            }) => Some(Versioned::new(p.clone(), *version)),
            _ => None,
        }
    }

    pub fn membership(&self, address: &WalletAddress) -> Option<Versioned<UserMembership>> {
        match self.docs.get(&DocumentKey::Membership(address.clone())) {
            Some(Versioned {
                value: Document::Membership(m),
                version,
            }) => Some(Versioned::new(m.clone(), *version)),
            _ => None,
        }
    }

    pub fn submission(&self, id: &SubmissionId) -> Option<Versioned<Submission>> {
        match self.docs.get(&DocumentKey::Submission(id.clone())) {
            Some(Versioned {
                value: Document::Submission(s),
                version,
            }) => Some(Versioned::new(s.clone(), *version)),
            _ => None,
        }
    }

    pub fn submissions_for(&self, program: &ProgramName) -> Vec<Versioned<Submission>> {
        let mut found: Vec<_> = self
            .docs
            .values()
            .filter_map(|doc| match &doc.value {
                Document::Submission(s) if &s.program == program => {
                    Some(Versioned::new(s.clone(), doc.version))
                }
                _ => None,
            })
            .collect();
        found.sort_by(|a, b| a.value.created_at.cmp(&b.value.created_at));
        found
    }

    pub fn programs(&self) -> Vec<BountyProgram> {
        self.docs
            .values()
            .filter_map(|doc| match &doc.value {
                Document::Program(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn memberships(&self) -> Vec<UserMembership> {
        self.docs
            .values()
            .filter_map(|doc| match &doc.value {
                Document::Membership(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Check every expectation, then apply every put. Nothing changes on
    /// error.
    pub fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for op in batch.ops() {
            let key = op.key();
            let actual = self.version_of(&key);
            if actual != op.expected_version() {
                return Err(StoreError::VersionConflict {
                    key: key.to_string(),
                    expected: op.expected_version(),
                    actual,
                });
            }
        }

        for op in batch.into_ops() {
            if let WriteOp::Put { document, .. } = op {
                let key = document.key();
                let version = self.version_of(&key).map_or(1, |v| v + 1);
                self.docs.insert(key, Versioned::new(document, version));
            }
        }
        Ok(())
    }

    /// Insert or replace a document outside any transaction.
    pub fn upsert(&mut self, document: Document) -> u64 {
        let key = document.key();
        let version = self.version_of(&key).map_or(1, |v| v + 1);
        self.docs.insert(key, Versioned::new(document, version));
        version
    }

    pub(crate) fn to_image(&self) -> TableImage {
        TableImage {
            documents: self.docs.values().cloned().collect(),
        }
    }

    pub(crate) fn from_image(image: TableImage) -> Self {
        let docs = image
            .documents
            .into_iter()
            .map(|doc| (doc.value.key(), doc))
            .collect();
        Self { docs }
    }
}

/// Document store kept entirely in memory.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    table: RwLock<DocumentTable>,
    fail_next_commit: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail with an I/O error after validation.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Copy of every stored document with its version.
    pub fn snapshot(&self) -> DocumentTable {
        self.table.read().clone()
    }

    pub fn seed_program(&self, program: BountyProgram) -> u64 {
        self.table.write().upsert(Document::Program(program))
    }

    pub fn seed_membership(&self, membership: UserMembership) -> u64 {
        self.table.write().upsert(Document::Membership(membership))
    }

    pub fn seed_submission(&self, submission: Submission) -> u64 {
        self.table.write().upsert(Document::Submission(submission))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load_program(
        &self,
        name: &ProgramName,
    ) -> Result<Option<Versioned<BountyProgram>>, StoreError> {
        Ok(self.table.read().program(name))
    }

    async fn load_membership(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Versioned<UserMembership>>, StoreError> {
        Ok(self.table.read().membership(address))
    }

    async fn load_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Versioned<Submission>>, StoreError> {
        Ok(self.table.read().submission(id))
    }

    async fn submissions_for_program(
        &self,
        program: &ProgramName,
    ) -> Result<Vec<Versioned<Submission>>, StoreError> {
        Ok(self.table.read().submissions_for(program))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut table = self.table.write();
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Io {
                message: "injected commit failure".to_string(),
            });
        }
        table.apply(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn acme() -> BountyProgram {
        BountyProgram::new(ProgramName::parse("Acme").unwrap())
    }

    #[tokio::test]
    async fn test_commit_bumps_versions() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.seed_program(acme()), 1);

        let loaded = store.load_program(&acme().name).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);

        let mut program = loaded.value;
        program
            .add_reviewer(WalletAddress::parse("0xa").unwrap())
            .unwrap();
        let mut batch = WriteBatch::new();
        batch.put(Document::Program(program), Some(1));
        store.commit(batch).await.unwrap();

        let reloaded = store.load_program(&acme().name).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 2);
        assert_eq!(reloaded.value.reviewer_addresses.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_guard_rejects_whole_batch() {
        let store = InMemoryDocumentStore::new();
        store.seed_program(acme());
        let submission = Submission::new(SubmissionId::generate(), acme().name, Utc::now());
        store.seed_submission(submission.clone());
        let before = store.snapshot();

        let mut batch = WriteBatch::new();
        batch.put(Document::Submission(submission), Some(1));
        batch.guard(DocumentKey::Program(acme().name), Some(7));

        let err = store.commit(batch).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_create_requires_absence() {
        let store = InMemoryDocumentStore::new();
        let membership = UserMembership::new(WalletAddress::parse("0xa").unwrap());

        let mut batch = WriteBatch::new();
        batch.put(Document::Membership(membership.clone()), None);
        store.commit(batch.clone()).await.unwrap();

        let err = store.commit(batch).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_state() {
        let store = InMemoryDocumentStore::new();
        store.seed_program(acme());
        let before = store.snapshot();

        store.fail_next_commit();
        let mut batch = WriteBatch::new();
        batch.put(Document::Program(acme()), Some(1));
        assert!(store.commit(batch.clone()).await.is_err());
        assert_eq!(store.snapshot(), before);

        store.commit(batch).await.unwrap();
        assert_eq!(store.snapshot().version_of(&DocumentKey::Program(acme().name)), Some(2));
    }

    #[test]
    fn test_submissions_for_program_filters() {
        let mut table = DocumentTable::new();
        let other = ProgramName::parse("Other").unwrap();
        table.upsert(Document::Submission(Submission::new(
            SubmissionId::generate(),
            acme().name,
            Utc::now(),
        )));
        table.upsert(Document::Submission(Submission::new(
            SubmissionId::generate(),
            other.clone(),
            Utc::now(),
        )));

        assert_eq!(table.submissions_for(&acme().name).len(), 1);
        assert_eq!(table.submissions_for(&other).len(), 1);
    }
}
