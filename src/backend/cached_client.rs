//! Backend facade that shares read-through caches across views.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::EntityCache;

use super::store::{EquipmentStore, FieldStore};
use super::types::{Equipment, LogEntry, Role};

/// Equipment store with session caches.
///
/// Clones share the same caches, so a summary saved from one view is
/// visible to every other view holding this handle.
#[derive(Clone)]
pub struct CachedBackend {
  store: Arc<dyn EquipmentStore>,
  fields: Arc<dyn FieldStore>,
  equipment: EntityCache<Equipment>,
  summaries: EntityCache<Option<String>>,
}

impl CachedBackend {
  pub fn new<S: EquipmentStore + 'static>(store: S, ttl: Option<Duration>) -> Self {
    let store = Arc::new(store);
    Self {
      store: store.clone(),
      fields: store,
      equipment: EntityCache::new().with_ttl(ttl),
      summaries: EntityCache::new().with_ttl(ttl),
    }
  }

  /// Fetch all equipment and seed the record cache with the results.
  pub async fn list_equipment(&self) -> Result<Vec<Equipment>> {
    let items = self.store.list_equipment().await?;
    for item in &items {
      self.equipment.set(&item.id, item.clone());
    }
    debug!(count = items.len(), "equipment list loaded");
    Ok(items)
  }

  /// Get a single record, served from cache when possible.
  ///
  /// A network fetch also seeds the summary cache, unless a saved summary is
  /// already cached for this record.
  pub async fn get_equipment(&self, id: &str) -> Result<Equipment> {
    let result = self
      .equipment
      .fetch_one(id, || self.store.get_equipment(id))
      .await?;

    if !result.is_cached() && self.summaries.get(id).is_none() {
      self.summaries.set(id, result.data.summary.clone());
    }

    debug!(id, source = ?result.source, "equipment loaded");
    Ok(result.data)
  }

  /// Get logs for a record (not cached - append-only and read once per view).
  pub async fn list_logs(&self, equipment_id: &str) -> Result<Vec<LogEntry>> {
    self.store.list_logs(equipment_id).await
  }

  pub async fn current_role(&self) -> Result<Role> {
    self.store.current_role().await
  }

  /// Drop every cached value for one record so the next read goes to the network.
  pub fn invalidate(&self, id: &str) {
    self.equipment.clear(id);
    self.summaries.clear(id);
  }

  /// Drop every cached record and summary; used by the list's full refresh.
  pub fn invalidate_all(&self) {
    if self.equipment.is_empty() && self.summaries.is_empty() {
      return;
    }
    debug!(
      records = self.equipment.len(),
      summaries = self.summaries.len(),
      "clearing caches"
    );
    self.equipment.clear_all();
    self.summaries.clear_all();
  }

  /// Persistence collaborator for editable fields
  pub fn field_store(&self) -> Arc<dyn FieldStore> {
    Arc::clone(&self.fields)
  }

  /// Cache shared by every summary field, keyed by equipment id
  pub fn summaries(&self) -> &EntityCache<Option<String>> {
    &self.summaries
  }

  pub fn equipment_cache(&self) -> &EntityCache<Equipment> {
    &self.equipment
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::store::{FieldUpdate, StoreFuture};
  use futures::FutureExt;
  use std::sync::atomic::{AtomicU32, Ordering};

  struct FakeStore {
    record: Equipment,
    fetches: Arc<AtomicU32>,
  }

  impl FieldStore for FakeStore {
    fn update_field(&self, _entity_id: &str, _update: FieldUpdate) -> StoreFuture<()> {
      async { Ok(()) }.boxed()
    }
  }

  impl EquipmentStore for FakeStore {
    fn list_equipment(&self) -> StoreFuture<Vec<Equipment>> {
      let record = self.record.clone();
      async move { Ok(vec![record]) }.boxed()
    }

    fn get_equipment(&self, _id: &str) -> StoreFuture<Equipment> {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      let record = self.record.clone();
      async move { Ok(record) }.boxed()
    }

    fn list_logs(&self, _equipment_id: &str) -> StoreFuture<Vec<LogEntry>> {
      async { Ok(Vec::new()) }.boxed()
    }

    fn current_role(&self) -> StoreFuture<Role> {
      async { Ok(Role::Admin) }.boxed()
    }
  }

  fn backend() -> (CachedBackend, Arc<AtomicU32>) {
    let fetches = Arc::new(AtomicU32::new(0));
    let store = FakeStore {
      record: Equipment {
        id: "E1".to_string(),
        name: "Crane".to_string(),
        equipment_type: None,
        status: None,
        latitude: None,
        longitude: None,
        summary: Some("From backend".to_string()),
        updated_at: None,
      },
      fetches: fetches.clone(),
    };
    (CachedBackend::new(store, None), fetches)
  }

  #[tokio::test]
  async fn test_get_equipment_reads_through() {
    let (backend, fetches) = backend();

    backend.get_equipment("E1").await.unwrap();
    backend.get_equipment("E1").await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(
      backend.summaries().get("E1"),
      Some(Some("From backend".to_string()))
    );
  }

  #[tokio::test]
  async fn test_fetch_keeps_saved_summary() {
    let (backend, _) = backend();
    backend
      .summaries()
      .set("E1", Some("Saved locally".to_string()));

    backend.get_equipment("E1").await.unwrap();
    assert_eq!(
      backend.summaries().get("E1"),
      Some(Some("Saved locally".to_string()))
    );
  }

  #[tokio::test]
  async fn test_list_seeds_record_cache_and_invalidate_clears() {
    let (backend, fetches) = backend();

    backend.list_equipment().await.unwrap();
    backend.get_equipment("E1").await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 0);

    backend.invalidate("E1");
    assert!(backend.equipment_cache().get("E1").is_none());
    assert!(backend.summaries().get("E1").is_none());

    backend.get_equipment("E1").await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidate_all_forces_network_reads() {
    let (backend, fetches) = backend();

    backend.list_equipment().await.unwrap();
    backend
      .summaries()
      .set("E2", Some("Other record".to_string()));

    backend.invalidate_all();
    assert!(backend.equipment_cache().is_empty());
    assert!(backend.summaries().is_empty());

    backend.get_equipment("E1").await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
  }
}
