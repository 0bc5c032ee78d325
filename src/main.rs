use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use room_directory::app::config::{AppConfig, StoreBackend};
use room_directory::directory::create::RoomCreator;
use room_directory::directory::RoomDirectory;
use room_directory::http;
use room_directory::store::memory::MemoryCollectionClient;
use room_directory::store::sqlite::SqliteCollectionClient;
use room_directory::store::CollectionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = AppConfig::from_env()?;

  let client: Arc<dyn CollectionClient> = match config.store {
    StoreBackend::Sqlite => Arc::new(
      SqliteCollectionClient::connect(&config.database_url)
        .await
        .context("failed to open room store")?,
    ),
    StoreBackend::Memory => {
      tracing::warn!("using in-memory room store, rooms are lost on exit");
      Arc::new(MemoryCollectionClient::new())
    }
  };

  let directory = RoomDirectory::activate(&*client, &config.collection)
    .await
    .with_context(|| format!("failed to subscribe to collection {:?}", config.collection))?;
  tracing::info!(
    collection = directory.collection(),
    rooms = directory.rooms().len(),
    "room directory loaded"
  );
  let creator = RoomCreator::new(
    Arc::clone(&client),
    config.collection.clone(),
    config.duplicate_ids,
  );
  let app = http::build_router(http::AppState::new(directory.watch(), creator));

  let address = format!("0.0.0.0:{}", config.port);
  tracing::info!(
    collection = %config.collection,
    duplicate_ids = ?config.duplicate_ids,
    "listening on {address}"
  );

  let listener = tokio::net::TcpListener::bind(&address).await?;
  // Releasing the directory closes live feeds so their sockets can drain.
  let shutdown = async move {
    shutdown_signal().await;
    directory.deactivate().await;
  };
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(error) = tokio::signal::ctrl_c().await {
    tracing::warn!(?error, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
