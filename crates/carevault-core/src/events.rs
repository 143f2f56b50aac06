//! Store change notifications
//!
//! The store itself is last-write-wins. Hosts that run several windows or
//! tabs over the same storage can subscribe here and refetch before writing.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A completed mutation of stored credential material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEvent {
    /// A new envelope replaced the record
    Stored,
    /// The record and key were removed on request
    Removed,
    /// The record and key were destroyed after a fingerprint mismatch
    Purged,
}

/// Broadcast channel for [`StoreEvent`]s.
///
/// Slow subscribers miss events (lagged) rather than blocking the store.
#[derive(Debug, Clone)]
pub struct StoreEvents {
    sender: broadcast::Sender<StoreEvent>,
}

impl StoreEvents {
    /// Create a channel buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive all future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish to every subscriber; returns how many received it
    pub fn publish(&self, event: StoreEvent) -> usize {
        // send() errs when nobody listens, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StoreEvents {
    fn default() -> Self {
        Self::new(16)
    }
}
