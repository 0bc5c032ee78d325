use super::{Snapshot, Subscription};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

#[derive(Debug)]
struct SubscriberEntry {
    collection: String,
    sender: UnboundedSender<Snapshot>,
}

/// Fans snapshots out to every live subscription of a collection.
///
/// Callers must hold their own write lock across "read snapshot, then register" and
/// "write, read snapshot, then publish" so that each subscriber sees snapshots in
/// commit order.
#[derive(Debug, Default)]
pub struct SubscriberHub {
    subscribers: DashMap<Uuid, SubscriberEntry>,
}

impl SubscriberHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(self: &Arc<Self>, initial: Snapshot) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let collection = initial.collection.clone();
        // The receiver is alive here, so the initial send cannot fail.
        let _ = sender.send(initial);
        self.subscribers.insert(
            id,
            SubscriberEntry {
                collection: collection.clone(),
                sender,
            },
        );
        tracing::debug!(subscription = %id, collection, "subscription opened");
        Subscription::new(id, collection, receiver, Arc::downgrade(self))
    }

    /// Delivers `snapshot` to every subscriber of its collection and returns how many
    /// received it. Subscribers whose receiver is gone are pruned.
    pub fn publish(&self, snapshot: &Snapshot) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.collection != snapshot.collection {
                continue;
            }
            if entry.sender.send(snapshot.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }
        for id in closed {
            self.subscribers.remove(&id);
        }
        delivered
    }

    pub fn remove(&self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.subscribers
            .iter()
            .filter(|entry| entry.collection == collection)
            .count()
    }
}
