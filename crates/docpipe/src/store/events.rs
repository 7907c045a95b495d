//! Change feed for state store mutations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::records::{FileRecord, JobRecord};

/// Default capacity of the change feed channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A snapshot of the record that just changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    File(FileRecord),
    Job(JobRecord),
}

/// Fan-out of store events. Sending never blocks; slow receivers lag.
#[derive(Clone)]
pub struct StoreEventBroadcaster {
    sender: Arc<broadcast::Sender<StoreEvent>>,
}

impl StoreEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: StoreEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StoreEventBroadcaster {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
