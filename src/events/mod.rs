//! Lifecycle notifications emitted by the cache frontend.
//!
//! Events are an observation-only side channel fanned out through a lossy
//! broadcast channel; callers must never depend on them for correctness.

use tokio::sync::broadcast;

#[cfg(test)]
mod events_test;

/// Buffer size for the broadcast channel; slow receivers lag and drop
/// older events rather than applying backpressure to cache operations.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Notification emitted by a cache operation.
///
/// Every mutating operation emits exactly one event after the backend call
/// completes; `get` emits exactly one of `Hit` / `Miss` / `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Set {
        key: String,
    },
    Hit {
        key: String,
    },
    Miss {
        key: String,
    },
    Error {
        key: String,
    },
    Clean {
        removed_keys: Vec<String>,
        /// Present when the clean originated from a tag operation.
        tags: Option<Vec<String>>,
    },
}

/// Fan-out for [`CacheEvent`]s, cloneable and shareable.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<CacheEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends an event to all subscribers, returning how many received it.
    /// Returns 0 when nobody is listening; that is not an error.
    pub fn send(&self, event: CacheEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribes to events broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
