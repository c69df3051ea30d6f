//! Event bus
//!
//! Single-process publish/subscribe for chat events. Built on tokio
//! broadcast channels: every receiver sees every published event in publish
//! order, a slow receiver only overflows its own buffer, and nothing is
//! replayed to late subscribers.

use super::events::ChatEvent;
use metrics::counter;
use tokio::sync::broadcast;

/// Default buffer size per subscriber
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// In-process event bus owned by the service layer.
///
/// Cloning is cheap and shares the underlying channel, so every component
/// that publishes holds its own handle; there is no global instance.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    /// Create a new event bus
    ///
    /// # Arguments
    /// * `capacity` - Events buffered per subscriber before lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers
    ///
    /// # Returns
    /// Number of active subscribers that received the event. Zero with no
    /// subscribers is not an error: the event simply evaporates.
    pub fn publish(&self, event: ChatEvent) -> usize {
        counter!("bus.events.published", "kind" => event.kind()).increment(1);

        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => 0, // No active receivers
        }
    }

    /// Publish multiple events in order
    pub fn publish_many(&self, events: Vec<ChatEvent>) {
        for event in events {
            let _ = self.publish(event);
        }
    }

    /// Register a new receiver
    ///
    /// The receiver only observes events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
