//! Event bus for costwatch using tokio::broadcast
//!
//! Lets dashboard consumers observe pipeline progress without polling the
//! stores.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by the pipeline
#[derive(Debug, Clone)]
pub enum DataEvent {
    /// An analysis run finished; carries the number of anomalies found
    AnalysisCompleted { anomaly_count: usize },
    /// A new anomaly was detected and persisted
    AnomalyDetected(Uuid),
    /// An alert reached a terminal dispatch status
    AlertDispatched(Uuid),
}

/// Event bus for broadcasting pipeline events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DataEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
