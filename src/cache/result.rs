//! Result metadata for read-through lookups.

/// Result of a read-through lookup, tagged with where the value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Wrap a value that was just fetched from the backend.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Wrap a value that was served from the cache.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Cache
  }
}

/// Indicates where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the backend on a miss
  Network,
  /// Served from a live cache entry
  Cache,
}
