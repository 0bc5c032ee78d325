//! Room directory service: mirrors a realtime "rooms" collection, filters it by a
//! search query, and creates rooms through a validated upsert.
pub mod app;
pub mod directory;
pub mod http;
pub mod shared;
pub mod store;
pub mod transport;
