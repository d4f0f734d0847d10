//! Domain event system — decoupled observation of a session.
//!
//! The orchestrator publishes events as turns start, complete, and the
//! session halts. Observers subscribe without coupling to the turn loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A worker was asked for a reply
    TurnStarted {
        conversation_id: String,
        turn: usize,
        worker: String,
        timestamp: DateTime<Utc>,
    },

    /// A worker's reply was appended to the history
    TurnCompleted {
        conversation_id: String,
        turn: usize,
        worker: String,
        halt: bool,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A worker's turn was abandoned without a reply
    TurnAbandoned {
        conversation_id: String,
        turn: usize,
        worker: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The session reached its terminal state
    SessionHalted {
        conversation_id: String,
        turns: usize,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::TurnStarted {
            conversation_id: "conv".into(),
            turn: 0,
            worker: "document_preprocessor".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::TurnStarted { worker, turn, .. } => {
                assert_eq!(worker, "document_preprocessor");
                assert_eq!(*turn, 0);
            }
            _ => panic!("Expected TurnStarted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::SessionHalted {
            conversation_id: "conv".into(),
            turns: 3,
            reason: "external".into(),
            timestamp: Utc::now(),
        });
    }
}
