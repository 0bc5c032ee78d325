//! Durable collection client on top of SQLite.
//!
//! Documents are stored as JSON text in a single `documents` table keyed by
//! `(collection, key)`. Change notifications are produced in-process: only writes that
//! go through this client reach its subscribers.
use super::hub::SubscriberHub;
use super::{
    validate_body, validate_collection, validate_key, CollectionClient, Document, Snapshot,
    StoreResult, Subscription,
};
use crate::app::time::now_millis;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug)]
pub struct SqliteCollectionClient {
    pool: SqlitePool,
    hub: Arc<SubscriberHub>,
    write_lock: Mutex<()>,
}

impl SqliteCollectionClient {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_db_dir(database_url)?;
        let options = if is_memory_url(database_url) {
            // Every connection to `sqlite::memory:` opens its own database, and closing
            // the last one discards it.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };
        let pool = options.connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(database_url, "sqlite collection store ready");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            hub: SubscriberHub::new(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load_snapshot(&self, collection: &str) -> StoreResult<Snapshot> {
        let rows = sqlx::query(
            "SELECT key, body FROM documents WHERE collection = ? ORDER BY key ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key")?;
            let body: String = row.try_get("body")?;
            documents.push(Document {
                key,
                body: serde_json::from_str(&body)?,
            });
        }
        Ok(Snapshot {
            collection: collection.to_string(),
            documents,
        })
    }
}

#[async_trait]
impl CollectionClient for SqliteCollectionClient {
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        validate_collection(collection)?;
        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot(collection).await?;
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
        let encoded = serde_json::to_string(&body)?;

        let _guard = self.write_lock.lock().await;
        sqlx::query(
            "INSERT INTO documents (collection, key, body, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(collection, key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(key)
        .bind(encoded)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        let snapshot = self.load_snapshot(collection).await?;
        let delivered = self.hub.publish(&snapshot);
        tracing::debug!(collection, key, delivered, "document upserted");
        Ok(())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.ends_with(":memory:")
}

fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
    if is_memory_url(database_url) {
        return Ok(());
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"));
    let Some(path) = path else { return Ok(()) };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Ok(());
    }
    let db_path = PathBuf::from(path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !db_path.exists() {
        let _ = std::fs::File::create(&db_path)?;
    }
    Ok(())
}
