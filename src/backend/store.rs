//! Seams between the UI and the hosted backend.

use color_eyre::Result;
use futures::future::BoxFuture;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::types::{Equipment, LogEntry, Role};

/// Future returned by store operations. `'static` so it can be spawned.
pub type StoreFuture<T> = BoxFuture<'static, Result<T>>;

/// A single-column update for one record.
///
/// Serializes as `{"<column>": value}`; a `None` value is sent as JSON `null`,
/// the backend's "no value" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
  pub column: String,
  pub value: Option<String>,
}

impl FieldUpdate {
  pub fn new(column: impl Into<String>, value: Option<String>) -> Self {
    Self {
      column: column.into(),
      value,
    }
  }
}

impl Serialize for FieldUpdate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(&self.column, &self.value)?;
    map.end()
  }
}

/// Persists edits to a single field. Each call is one remote write.
pub trait FieldStore: Send + Sync {
  fn update_field(&self, entity_id: &str, update: FieldUpdate) -> StoreFuture<()>;
}

/// Read access to equipment data on top of field writes.
pub trait EquipmentStore: FieldStore {
  fn list_equipment(&self) -> StoreFuture<Vec<Equipment>>;

  fn get_equipment(&self, id: &str) -> StoreFuture<Equipment>;

  /// Logs for one record, newest first
  fn list_logs(&self, equipment_id: &str) -> StoreFuture<Vec<LogEntry>>;

  /// Role of the signed-in user
  fn current_role(&self) -> StoreFuture<Role>;
}
