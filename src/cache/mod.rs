//! Session-scoped, entity-keyed caching.
//!
//! Views and fields share one `EntityCache` per payload type:
//! - Values are opaque to the cache and keyed by entity id
//! - Reads consult the cache before the backend (`fetch_one`)
//! - Writes to the backend are mirrored into the cache by the caller
//! - Nothing is persisted; entries may expire after an optional TTL

mod entity;
pub mod result;

pub use entity::EntityCache;
