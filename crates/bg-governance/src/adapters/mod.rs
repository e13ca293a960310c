//! Adapters implementing the outbound ports.

pub mod attachments;
pub mod event_bus;
pub mod file_store;
pub mod memory_store;

pub use attachments::InMemoryAttachmentDirectory;
pub use event_bus::{BroadcastEventBus, InMemoryEventSink};
pub use file_store::FileBackedDocumentStore;
pub use memory_store::{DocumentTable, InMemoryDocumentStore};
