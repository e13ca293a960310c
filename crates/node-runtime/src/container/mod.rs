//! # Node Container
//!
//! Owns the long-lived handles of a running node: the document store (one
//! handle, opened here and closed on shutdown), the event bus and the
//! governance service.

pub mod config;

pub use config::{ConfigError, NodeConfig, StorageBackend};

use bg_governance::{
    AttachmentDirectory, BroadcastEventBus, DocumentStore, FileBackedDocumentStore,
    GovernanceDependencies, GovernanceService, InMemoryAttachmentDirectory,
    InMemoryDocumentStore, StoreError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Handles shared by the runtime's tasks.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub store: Arc<dyn DocumentStore>,
    /// Set when the `file` backend is active; closed on shutdown.
    file_store: Option<Arc<FileBackedDocumentStore>>,
    pub event_bus: Arc<BroadcastEventBus>,
    pub attachments: Arc<InMemoryAttachmentDirectory>,
    pub service: Arc<GovernanceService>,
}

impl NodeContainer {
    /// Open the configured store and build the governance service over it.
    pub fn build(config: NodeConfig) -> Result<Self, StoreError> {
        let (store, file_store): (Arc<dyn DocumentStore>, _) = match config.storage.backend {
            StorageBackend::Memory => {
                info!(backend = "memory", "Using in-memory document store");
                (Arc::new(InMemoryDocumentStore::new()), None)
            }
            StorageBackend::File => {
                let path = config
                    .storage
                    .data_path
                    .clone()
                    .ok_or_else(|| StoreError::Unavailable {
                        message: "file backend configured without data_path".into(),
                    })?;
                let file = Arc::new(FileBackedDocumentStore::open(path)?);
                (file.clone() as Arc<dyn DocumentStore>, Some(file))
            }
        };

        let event_bus = Arc::new(BroadcastEventBus::default());
        let attachments = Arc::new(InMemoryAttachmentDirectory::new());
        let service = Arc::new(GovernanceService::new(GovernanceDependencies {
            store: Arc::clone(&store),
            events: event_bus.clone(),
            attachments: attachments.clone() as Arc<dyn AttachmentDirectory>,
            config: config.governance_config(),
        }));

        Ok(Self {
            config,
            store,
            file_store,
            event_bus,
            attachments,
            service,
        })
    }

    /// Flush pending writes and close the store handle.
    pub async fn close(&self) {
        if let Err(e) = self.store.flush().await {
            warn!(error = %e, "Store flush failed during shutdown");
        }
        if let Some(file) = &self.file_store {
            match file.close().await {
                Ok(()) => info!(path = %file.path().display(), "Document store closed"),
                Err(e) => warn!(error = %e, "Document store close failed"),
            }
        }
    }
}
