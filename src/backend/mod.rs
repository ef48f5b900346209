pub mod cached_client;
pub mod client;
pub mod store;
pub mod types;

pub use cached_client::CachedBackend;
pub use client::RestClient;
pub use store::{FieldStore, FieldUpdate};
pub use types::{Equipment, LogEntry, Role};
