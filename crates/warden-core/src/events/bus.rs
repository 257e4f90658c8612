//! In-process broadcast bus for domain events.

use tokio::sync::broadcast;
use tracing::debug;

use super::DomainEvent;

/// Fan-out channel carrying [`DomainEvent`]s to every subscriber.
///
/// Publishing never fails: with no subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: DomainEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "Domain event published"),
            Err(_) => debug!("Domain event dropped (no subscribers)"),
        }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
