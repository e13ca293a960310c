//! # Unit of Work
//!
//! Commit/rollback boundary around the three record families.
//!
//! Every document read through the unit of work is tracked with the
//! version it was read at. `into_batch` turns the tracked set into one
//! `WriteBatch`: modified documents become version-checked puts, untouched
//! ones become guards. The store applies the batch atomically, so a
//! concurrent writer to *anything* this transaction looked at makes the
//! commit fail instead of producing a mixed state.
//!
//! Dropping a unit of work without committing is the rollback: nothing has
//! been written.

use crate::domain::{BountyProgram, Submission, UserMembership};
use crate::ports::{Document, DocumentKey, Versioned, WriteBatch};
use shared_types::{ProgramName, SubmissionId, WalletAddress};
use std::collections::BTreeMap;

#[derive(Debug)]
struct Tracked<T> {
    /// Version at read time; `None` if the document did not exist.
    version: Option<u64>,
    original: Option<T>,
    current: Option<T>,
}

impl<T: Clone + PartialEq> Tracked<T> {
    fn from_load(loaded: Option<Versioned<T>>) -> Self {
        match loaded {
            Some(v) => Self {
                version: Some(v.version),
                original: Some(v.value.clone()),
                current: Some(v.value),
            },
            None => Self {
                version: None,
                original: None,
                current: None,
            },
        }
    }

    fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    fn stage(self, key: DocumentKey, wrap: fn(T) -> Document, batch: &mut WriteBatch) {
        let dirty = self.is_dirty();
        match self.current {
            Some(value) if dirty => batch.put(wrap(value), self.version),
            _ => batch.guard(key, self.version),
        }
    }
}

/// Tracked reads and staged writes of one transaction.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    programs: BTreeMap<ProgramName, Tracked<BountyProgram>>,
    memberships: BTreeMap<WalletAddress, Tracked<UserMembership>>,
    submissions: BTreeMap<SubmissionId, Tracked<Submission>>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    // === TRACKING ===

    pub fn track_program(&mut self, name: &ProgramName, loaded: Option<Versioned<BountyProgram>>) {
        self.programs
            .entry(name.clone())
            .or_insert_with(|| Tracked::from_load(loaded));
    }

    pub fn track_membership(
        &mut self,
        address: &WalletAddress,
        loaded: Option<Versioned<UserMembership>>,
    ) {
        self.memberships
            .entry(address.clone())
            .or_insert_with(|| Tracked::from_load(loaded));
    }

    pub fn track_submission(&mut self, loaded: Versioned<Submission>) {
        let id = loaded.value.id.clone();
        self.submissions
            .entry(id)
            .or_insert_with(|| Tracked::from_load(Some(loaded)));
    }

    // === ACCESS ===

    pub fn program(&self, name: &ProgramName) -> Option<&BountyProgram> {
        self.programs.get(name).and_then(|t| t.current.as_ref())
    }

    pub fn program_mut(&mut self, name: &ProgramName) -> Option<&mut BountyProgram> {
        self.programs.get_mut(name).and_then(|t| t.current.as_mut())
    }

    pub fn membership_mut(&mut self, address: &WalletAddress) -> Option<&mut UserMembership> {
        self.memberships
            .get_mut(address)
            .and_then(|t| t.current.as_mut())
    }

    /// The membership record for `address`, created empty if the store had
    /// none. An untracked address is staged as "must not exist yet".
    pub fn membership_or_create(&mut self, address: &WalletAddress) -> &mut UserMembership {
        let tracked = self
            .memberships
            .entry(address.clone())
            .or_insert_with(|| Tracked::from_load(None));
        tracked
            .current
            .get_or_insert_with(|| UserMembership::new(address.clone()))
    }

    pub fn submission(&self, id: &SubmissionId) -> Option<&Submission> {
        self.submissions.get(id).and_then(|t| t.current.as_ref())
    }

    pub fn submission_mut(&mut self, id: &SubmissionId) -> Option<&mut Submission> {
        self.submissions.get_mut(id).and_then(|t| t.current.as_mut())
    }

    pub fn submission_ids(&self) -> Vec<SubmissionId> {
        self.submissions.keys().cloned().collect()
    }

    /// Number of documents that would be written.
    pub fn dirty_count(&self) -> usize {
        self.programs.values().filter(|t| t.is_dirty()).count()
            + self.memberships.values().filter(|t| t.is_dirty()).count()
            + self.submissions.values().filter(|t| t.is_dirty()).count()
    }

    /// Stage every tracked document: puts for changes, guards for reads.
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (name, tracked) in self.programs {
            tracked.stage(DocumentKey::Program(name), Document::Program, &mut batch);
        }
        for (address, tracked) in self.memberships {
            tracked.stage(
                DocumentKey::Membership(address),
                Document::Membership,
                &mut batch,
            );
        }
        for (id, tracked) in self.submissions {
            tracked.stage(
                DocumentKey::Submission(id),
                Document::Submission,
                &mut batch,
            );
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WriteOp;
    use chrono::Utc;

    fn acme() -> ProgramName {
        ProgramName::parse("Acme").unwrap()
    }

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::parse(s).unwrap()
    }

    #[test]
    fn test_unchanged_reads_become_guards() {
        let mut uow = UnitOfWork::new();
        uow.track_program(&acme(), Some(Versioned::new(BountyProgram::new(acme()), 4)));

        let batch = uow.into_batch();
        assert_eq!(batch.write_count(), 0);
        assert_eq!(
            batch.ops(),
            &[WriteOp::Guard {
                key: DocumentKey::Program(acme()),
                expected_version: Some(4),
            }]
        );
    }

    #[test]
    fn test_modified_document_is_put_at_read_version() {
        let mut uow = UnitOfWork::new();
        uow.track_program(&acme(), Some(Versioned::new(BountyProgram::new(acme()), 2)));
        uow.program_mut(&acme())
            .unwrap()
            .add_reviewer(addr("0xa"))
            .unwrap();
        assert_eq!(uow.dirty_count(), 1);

        let batch = uow.into_batch();
        match &batch.ops()[0] {
            WriteOp::Put {
                document: Document::Program(p),
                expected_version,
            } => {
                assert_eq!(*expected_version, Some(2));
                assert!(p.is_reviewer(&addr("0xa")));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_membership_created_when_absent() {
        let mut uow = UnitOfWork::new();
        uow.track_membership(&addr("0xa"), None);
        uow.membership_or_create(&addr("0xa"))
            .assign_reviewer(&acme(), Utc::now());

        let batch = uow.into_batch();
        assert_eq!(batch.write_count(), 1);
        assert_eq!(batch.ops()[0].expected_version(), None);
    }

    #[test]
    fn test_reverted_change_is_not_dirty() {
        let mut uow = UnitOfWork::new();
        let submission = Submission::new(SubmissionId::generate(), acme(), Utc::now());
        let id = submission.id.clone();
        uow.track_submission(Versioned::new(submission, 1));

        let s = uow.submission_mut(&id).unwrap();
        s.manager_vote = None;
        assert_eq!(uow.dirty_count(), 0);
    }

    #[test]
    fn test_first_read_wins() {
        let mut uow = UnitOfWork::new();
        uow.track_program(&acme(), Some(Versioned::new(BountyProgram::new(acme()), 1)));
        uow.track_program(&acme(), Some(Versioned::new(BountyProgram::new(acme()), 9)));
        assert_eq!(uow.into_batch().ops()[0].expected_version(), Some(1));
    }
}
