/// Highlight activation event bus
/// Single-process pub/sub so list views react to clicks without polling
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{HighlightId, ThreadMetadata};

/// Handle identifying one subscriber, used to unsubscribe explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out channel for "highlight activated" notifications
///
/// Each subscriber gets its own unbounded channel; publishing sends
/// synchronously to every live subscriber and prunes the ones whose
/// receiving side was dropped, so subscriptions never leak.
#[derive(Debug, Default)]
pub struct HighlightEvents {
    subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<HighlightId>>,
    next_id: u64,
}

impl HighlightEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);

        Subscription { id, rx }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.remove(&id);
    }

    /// Deliver an activation to every live subscriber
    ///
    /// Returns the number of subscribers reached. Dropped receivers are
    /// removed as a side effect.
    pub fn publish(&mut self, highlight_id: HighlightId) -> usize {
        let mut delivered = 0;

        self.subscribers.retain(|_, tx| {
            let alive = tx.send(highlight_id).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });

        debug!(
            "highlight {} activation delivered to {} subscribers",
            highlight_id.0, delivered
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving side of one subscription
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<HighlightId>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Await the next activation; `None` once the bus side is gone
    pub async fn recv(&mut self) -> Option<HighlightId> {
        self.rx.recv().await
    }

    /// All activations delivered since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<HighlightId> {
        let mut ids = Vec::new();
        while let Ok(id) = self.rx.try_recv() {
            ids.push(id);
        }
        ids
    }

    /// Only the most recent activation, discarding older ones
    pub fn latest(&mut self) -> Option<HighlightId> {
        self.drain().pop()
    }
}

/// The per-subscriber active flag rule: a thread is active exactly when the
/// activated highlight is the one its metadata points at
pub fn is_active(activated: HighlightId, metadata: &ThreadMetadata) -> bool {
    metadata.highlight_id == activated
}
