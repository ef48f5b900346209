//! In-memory cache keyed by entity id.

use color_eyre::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use super::result::CacheResult;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
  value: V,
  stored_at: Instant,
}

/// Shared key-value store scoped by entity id.
///
/// Cloning the handle shares the underlying entries, so one instance can be
/// constructed per session and injected into every view that needs it.
/// Values are opaque payloads; the cache never inspects or validates them.
pub struct EntityCache<V> {
  entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
  /// Entries older than this read as absent. `None` keeps them for the session.
  ttl: Option<Duration>,
}

impl<V: Clone> EntityCache<V> {
  /// Create an empty cache whose entries live for the whole session.
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      ttl: None,
    }
  }

  /// Expire entries after `ttl`. Pass `None` to keep them indefinitely.
  pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
    self.ttl = ttl;
    self
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
    // Entries are plain data, a panic mid-write cannot leave them torn.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
    self
      .ttl
      .map(|ttl| entry.stored_at.elapsed() >= ttl)
      .unwrap_or(false)
  }

  /// Get the value stored for `key`, or `None` if there is no live entry.
  pub fn get(&self, key: &str) -> Option<V> {
    let mut entries = self.lock();
    match entries.get(key).map(|entry| self.is_expired(entry)) {
      Some(false) => entries.get(key).map(|entry| entry.value.clone()),
      Some(true) => {
        debug!(key, "cache entry expired");
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  /// Insert or overwrite the value for `key`.
  pub fn set(&self, key: &str, value: V) {
    self.lock().insert(
      key.to_string(),
      CacheEntry {
        value,
        stored_at: Instant::now(),
      },
    );
  }

  /// Apply `f` to the live entry for `key`, if any. Refreshes its timestamp.
  pub fn update(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
    let Some(mut value) = self.get(key) else {
      return false;
    };
    f(&mut value);
    self.set(key, value);
    true
  }

  /// Remove the entry for `key`. No-op when absent.
  pub fn clear(&self, key: &str) {
    self.lock().remove(key);
  }

  /// Remove every entry.
  pub fn clear_all(&self) {
    self.lock().clear();
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Read-through lookup for a single entity.
  ///
  /// 1. Return the cached value if there is a live entry
  /// 2. Otherwise await `fetcher` and store its result
  ///
  /// Fetch errors are returned as-is and leave the cache untouched.
  pub async fn fetch_one<F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<V>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
  {
    if let Some(cached) = self.get(key) {
      return Ok(CacheResult::from_cache(cached));
    }

    let data = fetcher().await?;
    self.set(key, data.clone());
    Ok(CacheResult::from_network(data))
  }
}

impl<V: Clone> Default for EntityCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V> Clone for EntityCache<V> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
      ttl: self.ttl,
    }
  }
}

impl<V> std::fmt::Debug for EntityCache<V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EntityCache")
      .field("ttl", &self.ttl)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::result::CacheSource;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[test]
  fn test_unwritten_key_is_absent() {
    let cache: EntityCache<String> = EntityCache::new();
    assert_eq!(cache.get("EQ-1"), None);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_set_then_get() {
    let cache = EntityCache::new();
    cache.set("EQ-1", "Forklift".to_string());
    assert_eq!(cache.get("EQ-1"), Some("Forklift".to_string()));

    cache.set("EQ-1", "Pallet jack".to_string());
    assert_eq!(cache.get("EQ-1"), Some("Pallet jack".to_string()));
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn test_no_value_marker_is_distinct_from_absence() {
    let cache: EntityCache<Option<String>> = EntityCache::new();
    cache.set("EQ-1", None);
    assert_eq!(cache.get("EQ-1"), Some(None));
    assert_eq!(cache.get("EQ-2"), None);
  }

  #[test]
  fn test_clear() {
    let cache = EntityCache::new();
    cache.set("EQ-1", 1);
    cache.set("EQ-2", 2);

    cache.clear("EQ-1");
    assert_eq!(cache.get("EQ-1"), None);
    assert_eq!(cache.get("EQ-2"), Some(2));

    // Clearing a missing key is a no-op
    cache.clear("EQ-404");
    assert_eq!(cache.len(), 1);

    cache.clear_all();
    assert!(cache.is_empty());
  }

  #[test]
  fn test_clones_share_entries() {
    let cache = EntityCache::new();
    let other = cache.clone();
    other.set("EQ-1", "shared".to_string());
    assert_eq!(cache.get("EQ-1"), Some("shared".to_string()));
  }

  #[test]
  fn test_zero_ttl_expires_immediately() {
    let cache = EntityCache::new().with_ttl(Some(Duration::ZERO));
    cache.set("EQ-1", 7);
    assert_eq!(cache.get("EQ-1"), None);
    // Expired entries are dropped on read
    assert!(cache.is_empty());
  }

  #[test]
  fn test_update_existing_entry() {
    let cache = EntityCache::new();
    assert!(!cache.update("EQ-1", |v: &mut Vec<i32>| v.push(1)));

    cache.set("EQ-1", vec![1]);
    assert!(cache.update("EQ-1", |v| v.push(2)));
    assert_eq!(cache.get("EQ-1"), Some(vec![1, 2]));
  }

  #[tokio::test]
  async fn test_fetch_one_reads_through() {
    let cache = EntityCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    for expected in [CacheSource::Network, CacheSource::Cache] {
      let calls = calls.clone();
      let result = cache
        .fetch_one("EQ-1", || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok("from backend".to_string())
        })
        .await
        .unwrap();
      assert_eq!(result.data, "from backend");
      assert_eq!(result.source, expected);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_one_error_does_not_populate() {
    let cache: EntityCache<String> = EntityCache::new();
    let result = cache
      .fetch_one("EQ-1", || async { Err(eyre!("backend down")) })
      .await;

    assert!(result.is_err());
    assert_eq!(cache.get("EQ-1"), None);
  }
}
