use crate::directory::create::DuplicateIdPolicy;
use anyhow::{bail, Context};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_COLLECTION: &str = "rooms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub database_url: String,
    pub collection: String,
    pub duplicate_ids: DuplicateIdPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match value("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("invalid PORT {port:?}"))?,
            None => DEFAULT_PORT,
        };
        let store = match value("ROOM_STORE").as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("ROOM_STORE must be \"sqlite\" or \"memory\", got {other:?}"),
        };
        let duplicate_ids = match value("DUPLICATE_ROOM_IDS").as_deref() {
            None | Some("overwrite") => DuplicateIdPolicy::Overwrite,
            Some("reject") => DuplicateIdPolicy::Reject,
            Some(other) => {
                bail!("DUPLICATE_ROOM_IDS must be \"overwrite\" or \"reject\", got {other:?}")
            }
        };
        let database_url = value("DATABASE_URL").unwrap_or_else(|| {
            let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let default_path = base.join("data").join("rooms.db");
            format!("sqlite://{}", default_path.display())
        });
        let collection = value("ROOMS_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        if collection.contains('/') {
            bail!("ROOMS_COLLECTION must not contain '/'");
        }

        Ok(Self {
            port,
            store,
            database_url,
            collection,
            duplicate_ids,
        })
    }
}
