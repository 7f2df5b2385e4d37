//! Event Bus - host → highlighter signals
//!
//! Design: Type-safe events over a broadcast channel.
//! The host says when a document is ready (or gone); the session answers
//! with a completion event.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::highlight::RunMode;

/// Events exchanged between host and session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    /// The document at `url` is fully rendered and may be processed
    DocumentReady { url: String },
    /// The host left `url` before it became ready
    NavigatedAway { url: String },
    /// A run finished on `url`
    RunCompleted {
        url: String,
        mode: RunMode,
        total: usize,
    },
}

/// Simple event bus using tokio broadcast channel
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: HostEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(HostEvent::DocumentReady {
            url: "file:///tmp/10K/a.html".to_string(),
        });

        match rx.recv().await {
            Ok(HostEvent::DocumentReady { url }) => assert!(url.ends_with("a.html")),
            _ => panic!("Expected DocumentReady event"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(HostEvent::NavigatedAway {
            url: "https://example.com".to_string(),
        });
    }
}
