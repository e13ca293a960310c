//! Attachment directory adapter.

use crate::ports::{AttachmentDirectory, AttachmentMeta};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::SubmissionId;
use std::collections::HashMap;

/// Attachment metadata held in memory, keyed by submission.
#[derive(Default)]
pub struct InMemoryAttachmentDirectory {
    files: RwLock<HashMap<SubmissionId, Vec<AttachmentMeta>>>,
}

impl InMemoryAttachmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, submission: SubmissionId, attachment: AttachmentMeta) {
        self.files
            .write()
            .entry(submission)
            .or_default()
            .push(attachment);
    }
}

#[async_trait]
impl AttachmentDirectory for InMemoryAttachmentDirectory {
    async fn attachments_for(
        &self,
        submission: &SubmissionId,
    ) -> Result<Vec<AttachmentMeta>, String> {
        Ok(self
            .files
            .read()
            .get(submission)
            .cloned()
            .unwrap_or_default())
    }
}
