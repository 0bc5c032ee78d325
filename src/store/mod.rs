//! Document collections with realtime snapshot subscriptions.
//!
//! A [`CollectionClient`] exposes two primitives: `subscribe`, which yields the full
//! current set of documents in a collection followed by a fresh full set after every
//! change, and `upsert`, which creates or overwrites a document by key. Snapshots are
//! ordered by document key.
use async_trait::async_trait;
use futures_util::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub mod hub;
pub mod memory;
pub mod sqlite;

use hub::SubscriberHub;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub key: String,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub collection: String,
    pub documents: Vec<Document>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("invalid document key: {0:?}")]
    InvalidKey(String),
    #[error("document body must be a JSON object")]
    InvalidBody,
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Opens a subscription whose first event is the current snapshot.
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription>;

    /// Creates the document at `key`, or replaces its body if it already exists.
    async fn upsert(&self, collection: &str, key: &str, body: serde_json::Value)
        -> StoreResult<()>;
}

/// Handle on a live snapshot feed. Released when unsubscribed or dropped; after that
/// the store no longer delivers to it. The handle does not keep the issuing client
/// alive: once the client is dropped the feed ends.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    collection: String,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    hub: Weak<SubscriberHub>,
}

impl Subscription {
    pub(crate) fn new(
        id: Uuid,
        collection: String,
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        hub: Weak<SubscriberHub>,
    ) -> Self {
        Self {
            id,
            collection,
            receiver,
            hub,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next snapshot. Snapshots keep coming for as long as the issuing
    /// client lives; `None` means the client was dropped.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
        tracing::debug!(subscription = %self.id, collection = %self.collection, "subscription released");
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

pub(crate) fn validate_collection(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty() || collection.contains('/') {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.trim().is_empty() || key.contains('/') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_body(body: &serde_json::Value) -> StoreResult<()> {
    if !body.is_object() {
        return Err(StoreError::InvalidBody);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_names() {
        assert!(matches!(
            validate_collection("rooms/a"),
            Err(StoreError::InvalidCollection(_))
        ));
        assert!(matches!(validate_key(""), Err(StoreError::InvalidKey(_))));
        assert!(matches!(validate_key("a/b"), Err(StoreError::InvalidKey(_))));
        assert!(validate_key("gen").is_ok());
        assert!(validate_collection("rooms").is_ok());
    }

    #[test]
    fn body_must_be_object() {
        assert!(matches!(
            validate_body(&serde_json::json!("General")),
            Err(StoreError::InvalidBody)
        ));
        assert!(validate_body(&serde_json::json!({ "name": "General" })).is_ok());
    }
}
