//! Local mirror of the rooms collection.
//!
//! [`RoomDirectory`] holds one subscription for its whole lifetime and replaces the
//! room list wholesale on every snapshot. The list is published through a watch
//! channel: the sync task is the only writer, any number of views read it.
use crate::store::{CollectionClient, Snapshot, StoreResult, Subscription};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

pub mod create;
pub mod filter;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Maps every document to a room, keeping snapshot order. A missing or non-string
/// `name` field becomes an empty name.
pub fn rooms_from_snapshot(snapshot: &Snapshot) -> Vec<Room> {
    snapshot
        .documents
        .iter()
        .map(|document| {
            let name = document
                .body
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            Room::new(document.key.as_str(), name)
        })
        .collect()
}

pub type RoomList = Arc<Vec<Room>>;

pub struct RoomDirectory {
    collection: String,
    rooms: watch::Receiver<RoomList>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RoomDirectory {
    /// Subscribes and waits for the initial snapshot, so the directory is populated
    /// by the time it is returned.
    pub async fn activate(client: &dyn CollectionClient, collection: &str) -> StoreResult<Self> {
        let mut subscription = client.subscribe(collection).await?;
        let initial = subscription
            .next_snapshot()
            .await
            .map(|snapshot| rooms_from_snapshot(&snapshot))
            .unwrap_or_default();
        tracing::debug!(collection, rooms = initial.len(), "initial room snapshot applied");
        let (rooms_tx, rooms_rx) = watch::channel(Arc::new(initial));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(sync_rooms(subscription, rooms_tx, shutdown_rx));
        tracing::info!(collection, "room directory activated");
        Ok(Self {
            collection: collection.to_string(),
            rooms: rooms_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The last snapshot delivered by the subscription.
    pub fn rooms(&self) -> RoomList {
        self.rooms.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<RoomList> {
        self.rooms.clone()
    }

    /// Releases the subscription and waits for the sync task to finish.
    pub async fn deactivate(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::warn!(?error, collection = %self.collection, "room sync task failed");
            }
        }
        tracing::info!(collection = %self.collection, "room directory deactivated");
    }
}

impl Drop for RoomDirectory {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn sync_rooms(
    mut subscription: Subscription,
    rooms: watch::Sender<RoomList>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let collection = subscription.collection().to_string();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            snapshot = subscription.next_snapshot() => {
                let Some(snapshot) = snapshot else {
                    tracing::warn!(collection, "room subscription ended");
                    break;
                };
                let list = rooms_from_snapshot(&snapshot);
                tracing::debug!(collection, rooms = list.len(), "room snapshot applied");
                rooms.send_replace(Arc::new(list));
            }
        }
    }
    subscription.unsubscribe();
}
