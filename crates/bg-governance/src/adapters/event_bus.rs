//! Event sink adapters.

use crate::events::GovernanceEvent;
use crate::ports::GovernanceEventSink;
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Fan-out bus backed by a tokio broadcast channel.
///
/// Publishing with no subscribers is not an error; the event is dropped.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl GovernanceEventSink for BroadcastEventBus {
    fn publish(&self, event: GovernanceEvent) -> Result<(), String> {
        // SendError only means nobody is listening.
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// In-memory sink for testing
pub struct InMemoryEventSink {
    events: RwLock<Vec<GovernanceEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.read().iter().map(|e| e.name()).collect()
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceEventSink for InMemoryEventSink {
    fn publish(&self, event: GovernanceEvent) -> Result<(), String> {
        self.events.write().push(event);
        Ok(())
    }
}
