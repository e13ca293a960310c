//! # File-Backed Document Store
//!
//! Keeps the table in memory and rewrites a JSON snapshot on every commit.
//! The snapshot is written to a temp file and renamed into place, so a
//! crash leaves either the old or the new file, never a torn one.

use super::memory_store::{DocumentTable, TableImage};
use crate::domain::{BountyProgram, StoreError, Submission, UserMembership};
use crate::ports::{DocumentStore, Versioned, WriteBatch};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ProgramName, SubmissionId, WalletAddress};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

struct Inner {
    table: DocumentTable,
    closed: bool,
}

/// Durable document store for single-node deployments.
///
/// Reads go straight to the in-memory table. Writers are serialized by
/// `writer`, which is held across the snapshot write so that validation,
/// persistence and the swap of the table happen as one step.
pub struct FileBackedDocumentStore {
    inner: Mutex<Inner>,
    writer: tokio::sync::Mutex<()>,
    path: PathBuf,
}

fn io_error(err: std::io::Error) -> StoreError {
    StoreError::Io {
        message: err.to_string(),
    }
}

/// Blocking temp-file write and rename.
fn write_snapshot_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    std::fs::rename(&temp_path, path).map_err(io_error)?;
    Ok(())
}

impl FileBackedDocumentStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let table = match std::fs::read(&path) {
            Ok(bytes) => {
                let image: TableImage =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                        key: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                DocumentTable::from_image(image)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => DocumentTable::new(),
            Err(err) => return Err(io_error(err)),
        };

        info!(
            path = %path.display(),
            documents = table.len(),
            "Opened governance document store"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                table,
                closed: false,
            }),
            writer: tokio::sync::Mutex::new(()),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and refuse further commits.
    pub async fn close(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let table = {
            let inner = self.inner.lock();
            if inner.closed {
                return Ok(());
            }
            inner.table.clone()
        };
        self.persist(&table).await?;
        self.inner.lock().closed = true;
        info!(path = %self.path.display(), "Closed governance document store");
        Ok(())
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> DocumentTable {
        self.inner.lock().table.clone()
    }

    /// Apply a batch of seed writes outside any transaction and persist.
    pub async fn seed_with(&self, seed: impl FnOnce(&mut DocumentTable)) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let mut next = self.inner.lock().table.clone();
        seed(&mut next);
        self.persist(&next).await?;
        self.inner.lock().table = next;
        Ok(())
    }

    /// Serialize `table` and write it on the blocking pool.
    async fn persist(&self, table: &DocumentTable) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&table.to_image()).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })?;
        let len = bytes.len();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot_file(&path, &bytes))
            .await
            .map_err(|e| StoreError::Io {
                message: format!("snapshot writer failed: {}", e),
            })??;

        debug!(path = %self.path.display(), bytes = len, "Wrote store snapshot");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileBackedDocumentStore {
    async fn load_program(
        &self,
        name: &ProgramName,
    ) -> Result<Option<Versioned<BountyProgram>>, StoreError> {
        Ok(self.inner.lock().table.program(name))
    }

    async fn load_membership(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Versioned<UserMembership>>, StoreError> {
        Ok(self.inner.lock().table.membership(address))
    }

    async fn load_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Versioned<Submission>>, StoreError> {
        Ok(self.inner.lock().table.submission(id))
    }

    async fn submissions_for_program(
        &self,
        program: &ProgramName,
    ) -> Result<Vec<Versioned<Submission>>, StoreError> {
        Ok(self.inner.lock().table.submissions_for(program))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        // Stage on a copy so a failed write leaves memory and disk in step.
        let next = {
            let inner = self.inner.lock();
            if inner.closed {
                return Err(StoreError::Unavailable {
                    message: "store is closed".to_string(),
                });
            }
            let mut next = inner.table.clone();
            next.apply(batch)?;
            next
        };
        self.persist(&next).await?;
        self.inner.lock().table = next;
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let table = self.inner.lock().table.clone();
        self.persist(&table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Document;
    use chrono::Utc;

    fn acme() -> BountyProgram {
        BountyProgram::new(ProgramName::parse("Acme").unwrap())
    }

    #[tokio::test]
    async fn test_commit_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("governance.json");

        let submission = Submission::new(SubmissionId::generate(), acme().name, Utc::now());
        {
            let store = FileBackedDocumentStore::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch.put(Document::Program(acme()), None);
            batch.put(Document::Submission(submission.clone()), None);
            store.commit(batch).await.unwrap();
            store.close().await.unwrap();
        }

        let reopened = FileBackedDocumentStore::open(&path).unwrap();
        let program = reopened.load_program(&acme().name).await.unwrap().unwrap();
        assert_eq!(program.version, 1);
        let loaded = reopened
            .load_submission(&submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.value, submission);
    }

    #[tokio::test]
    async fn test_conflict_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("governance.json");
        let store = FileBackedDocumentStore::open(&path).unwrap();
        store
            .seed_with(|t| {
                t.upsert(Document::Program(acme()));
            })
            .await
            .unwrap();
        let on_disk = std::fs::read(&path).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Document::Program(acme()), Some(5));
        assert!(store.commit(batch).await.unwrap_err().is_conflict());
        assert_eq!(std::fs::read(&path).unwrap(), on_disk);
    }

    #[tokio::test]
    async fn test_closed_store_refuses_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBackedDocumentStore::open(dir.path().join("g.json")).unwrap();
        store.close().await.unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Document::Program(acme()), None);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::Unavailable { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("governance.json");
        let store = std::sync::Arc::new(FileBackedDocumentStore::open(&path).unwrap());
        let mut batch = WriteBatch::new();
        batch.put(Document::Program(acme()), None);
        store.commit(batch).await.unwrap();

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let submission =
                        Submission::new(SubmissionId::generate(), acme().name, Utc::now());
                    let mut batch = WriteBatch::new();
                    batch.put(Document::Submission(submission), None);
                    store.commit(batch).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        store.close().await.unwrap();

        let reopened = FileBackedDocumentStore::open(&path).unwrap();
        let on_disk = reopened.submissions_for_program(&acme().name).await.unwrap();
        assert_eq!(on_disk.len(), 8);
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            FileBackedDocumentStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
