use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A tracked piece of equipment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Equipment {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: String,
  pub name: String,
  #[serde(rename = "type", default)]
  pub equipment_type: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
  #[serde(default)]
  pub summary: Option<String>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Equipment {
  /// "lat, lon" with 5 decimals, or None if the record has no position
  pub fn position(&self) -> Option<String> {
    match (self.latitude, self.longitude) {
      (Some(lat), Some(lon)) => Some(format!("{:.5}, {:.5}", lat, lon)),
      _ => None,
    }
  }
}

/// A maintenance/usage log line attached to a piece of equipment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: String,
  #[serde(deserialize_with = "deserialize_id")]
  pub equipment_id: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub note: String,
}

/// Access level of the signed-in user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
  Admin,
  #[default]
  Viewer,
}

impl Role {
  /// Map a profile role name; anything unrecognized is read-only.
  pub fn from_name(name: &str) -> Self {
    match name.trim().to_lowercase().as_str() {
      "admin" => Role::Admin,
      _ => Role::Viewer,
    }
  }

  /// Whether this role may enter edit mode and save fields
  pub fn can_edit(self) -> bool {
    matches!(self, Role::Admin)
  }

  pub fn label(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Viewer => "viewer",
    }
  }
}

/// Ids are uuids in some tables and integers in others; keep them as strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Text(String),
    Number(i64),
  }

  Ok(match RawId::deserialize(deserializer)? {
    RawId::Text(s) => s,
    RawId::Number(n) => n.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equipment_from_row() {
    let row = r#"{
      "id": 42,
      "name": "Excavator 3",
      "type": "excavator",
      "status": "in_service",
      "latitude": 59.3293,
      "longitude": 18.0686,
      "summary": null,
      "updated_at": "2024-05-01T10:00:00+00:00"
    }"#;
    let equipment: Equipment = serde_json::from_str(row).unwrap();
    assert_eq!(equipment.id, "42");
    assert_eq!(equipment.equipment_type.as_deref(), Some("excavator"));
    assert_eq!(equipment.summary, None);
    assert_eq!(equipment.position().as_deref(), Some("59.32930, 18.06860"));
  }

  #[test]
  fn test_equipment_minimal_row() {
    let row = r#"{"id": "6f1c", "name": "Generator"}"#;
    let equipment: Equipment = serde_json::from_str(row).unwrap();
    assert_eq!(equipment.id, "6f1c");
    assert_eq!(equipment.position(), None);
    assert_eq!(equipment.status, None);
  }

  #[test]
  fn test_role_from_name() {
    assert_eq!(Role::from_name("admin"), Role::Admin);
    assert_eq!(Role::from_name(" Admin "), Role::Admin);
    assert_eq!(Role::from_name("technician"), Role::Viewer);
    assert!(Role::Admin.can_edit());
    assert!(!Role::Viewer.can_edit());
  }
}
