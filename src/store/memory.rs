//! In-process collection client.
//!
//! Nothing is durable: documents live for as long as the client does. Useful for local
//! development and tests. Mutations and subscription registration share one lock, so
//! every subscriber observes snapshots in commit order.
use super::hub::SubscriberHub;
use super::{
    validate_body, validate_collection, validate_key, CollectionClient, Document, Snapshot,
    StoreResult, Subscription,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

type Collection = BTreeMap<String, serde_json::Value>;

#[derive(Debug)]
pub struct MemoryCollectionClient {
    collections: Mutex<HashMap<String, Collection>>,
    hub: Arc<SubscriberHub>,
}

impl MemoryCollectionClient {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            hub: SubscriberHub::new(),
        }
    }

    /// Removes a document, notifying subscribers if it existed.
    #[cfg(test)]
    pub async fn delete(&self, collection: &str, key: &str) -> StoreResult<bool> {
        validate_collection(collection)?;
        validate_key(key)?;
        let mut collections = self.collections.lock().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        if documents.remove(key).is_none() {
            return Ok(false);
        }
        let snapshot = snapshot_of(collection, Some(&*documents));
        let delivered = self.hub.publish(&snapshot);
        tracing::debug!(collection, key, delivered, "document deleted");
        Ok(true)
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.hub.subscriber_count(collection)
    }
}

impl Default for MemoryCollectionClient {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_of(collection: &str, documents: Option<&Collection>) -> Snapshot {
    Snapshot {
        collection: collection.to_string(),
        documents: documents
            .map(|documents| {
                documents
                    .iter()
                    .map(|(key, body)| Document {
                        key: key.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[async_trait]
impl CollectionClient for MemoryCollectionClient {
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        validate_collection(collection)?;
        let collections = self.collections.lock().await;
        let snapshot = snapshot_of(collection, collections.get(collection));
        Ok(self.hub.register(snapshot))
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        body: serde_json::Value,
    ) -> StoreResult<()> {
        validate_collection(collection)?;
        validate_key(key)?;
        validate_body(&body)?;
        let mut collections = self.collections.lock().await;
        let documents = collections.entry(collection.to_string()).or_default();
        documents.insert(key.to_string(), body);
        let snapshot = snapshot_of(collection, Some(&*documents));
        let delivered = self.hub.publish(&snapshot);
        tracing::debug!(collection, key, delivered, "document upserted");
        Ok(())
    }
}
