//! Background tasks wired off the governance event bus.

pub mod event_logging;

pub use event_logging::spawn_event_logger;
