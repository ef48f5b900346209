use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use futures::FutureExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::store::{EquipmentStore, FieldStore, FieldUpdate, StoreFuture};
use super::types::{Equipment, LogEntry, Role};

/// Error body returned by the REST and auth endpoints
#[derive(Debug, Deserialize)]
struct ApiError {
  message: Option<String>,
  #[serde(alias = "error_description")]
  msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
  id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProfile {
  role: Option<String>,
}

#[derive(Debug, Clone)]
struct Tables {
  equipment: String,
  logs: String,
  profiles: String,
}

/// REST client for the hosted backend (PostgREST tables + auth endpoint)
#[derive(Clone)]
pub struct RestClient {
  http: reqwest::Client,
  base: Url,
  anon_key: String,
  access_token: Option<String>,
  tables: Tables,
}

impl RestClient {
  pub fn new(config: &Config) -> Result<Self> {
    let anon_key = config.anon_key()?;
    let base = parse_base_url(&config.backend.url)?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("eqtrack/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      anon_key,
      access_token: Config::access_token(),
      tables: Tables {
        equipment: config.backend.equipment_table.clone(),
        logs: config.backend.logs_table.clone(),
        profiles: config.backend.profiles_table.clone(),
      },
    })
  }

  /// Backend URL, for header display
  pub fn base_url(&self) -> &Url {
    &self.base
  }

  /// Whether requests are made on behalf of a signed-in user
  pub fn is_signed_in(&self) -> bool {
    self.access_token.is_some()
  }

  fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url> {
    endpoint(&self.base, &format!("rest/v1/{}", table), query)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
    self
      .http
      .request(method, url)
      .header("apikey", &self.anon_key)
      .bearer_auth(bearer)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
    debug!(%url, "GET");
    let response = self
      .request(Method::GET, url)
      .send()
      .await
      .map_err(|e| eyre!("Request failed: {}", e))?;

    check_status(response)
      .await?
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse response: {}", e))
  }

  /// List all equipment ordered by name
  pub async fn list_equipment(&self) -> Result<Vec<Equipment>> {
    let url = self.table_url(
      &self.tables.equipment,
      &[("select", "*".into()), ("order", "name.asc".into())],
    )?;
    self.get_json(url).await
  }

  /// Get a single equipment record by id
  pub async fn get_equipment(&self, id: &str) -> Result<Equipment> {
    let url = self.table_url(
      &self.tables.equipment,
      &[("select", "*".into()), ("id", format!("eq.{}", id))],
    )?;
    let rows: Vec<Equipment> = self.get_json(url).await?;

    rows
      .into_iter()
      .next()
      .ok_or_else(|| eyre!("Equipment {} not found", id))
  }

  /// Get log entries for one record, newest first
  pub async fn list_logs(&self, equipment_id: &str) -> Result<Vec<LogEntry>> {
    let url = self.table_url(
      &self.tables.logs,
      &[
        ("select", "*".into()),
        ("equipment_id", format!("eq.{}", equipment_id)),
        ("order", "created_at.desc".into()),
      ],
    )?;
    self.get_json(url).await
  }

  /// Write a single column of one equipment record
  pub async fn update_equipment(&self, id: &str, update: &FieldUpdate) -> Result<()> {
    let url = self.table_url(&self.tables.equipment, &[("id", format!("eq.{}", id))])?;
    debug!(%url, column = %update.column, "PATCH");

    let response = self
      .request(Method::PATCH, url)
      .header("Prefer", "return=representation")
      .json(update)
      .send()
      .await
      .map_err(|e| eyre!("Request failed: {}", e))?;

    let rows: Vec<Value> = check_status(response)
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response: {}", e))?;

    // Row-level security turns a forbidden update into an empty result
    if rows.is_empty() {
      return Err(eyre!("No equipment record {} was updated", id));
    }

    Ok(())
  }

  /// Resolve the signed-in user's role from their profile row
  pub async fn current_role(&self) -> Result<Role> {
    if !self.is_signed_in() {
      return Ok(Role::Viewer);
    }

    let user: ApiUser = self
      .get_json(endpoint(&self.base, "auth/v1/user", &[])?)
      .await?;

    let url = self.table_url(
      &self.tables.profiles,
      &[("select", "role".into()), ("id", format!("eq.{}", user.id))],
    )?;
    let profiles: Vec<ApiProfile> = self.get_json(url).await?;

    let role = match profiles.into_iter().next().and_then(|p| p.role) {
      Some(name) => Role::from_name(&name),
      None => {
        warn!(user = %user.id, "no profile role, defaulting to viewer");
        Role::Viewer
      }
    };
    Ok(role)
  }
}

impl FieldStore for RestClient {
  fn update_field(&self, entity_id: &str, update: FieldUpdate) -> StoreFuture<()> {
    let client = self.clone();
    let id = entity_id.to_string();
    async move { client.update_equipment(&id, &update).await }.boxed()
  }
}

impl EquipmentStore for RestClient {
  fn list_equipment(&self) -> StoreFuture<Vec<Equipment>> {
    let client = self.clone();
    async move { client.list_equipment().await }.boxed()
  }

  fn get_equipment(&self, id: &str) -> StoreFuture<Equipment> {
    let client = self.clone();
    let id = id.to_string();
    async move { client.get_equipment(&id).await }.boxed()
  }

  fn list_logs(&self, equipment_id: &str) -> StoreFuture<Vec<LogEntry>> {
    let client = self.clone();
    let id = equipment_id.to_string();
    async move { client.list_logs(&id).await }.boxed()
  }

  fn current_role(&self) -> StoreFuture<Role> {
    let client = self.clone();
    async move { client.current_role().await }.boxed()
  }
}

/// Parse the configured project URL, normalized with a trailing slash so
/// relative joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw.trim()).map_err(|e| eyre!("Invalid backend url {}: {}", raw, e))?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

fn endpoint(base: &Url, path: &str, query: &[(&str, String)]) -> Result<Url> {
  let mut url = base
    .join(path)
    .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))?;
  if !query.is_empty() {
    url
      .query_pairs_mut()
      .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
  }
  Ok(url)
}

async fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  Err(eyre!("{}", error_message(status, &body)))
}

/// Prefer the backend's own message over the bare status line
fn error_message(status: StatusCode, body: &str) -> String {
  serde_json::from_str::<ApiError>(body)
    .ok()
    .and_then(|e| e.message.or(e.msg))
    .unwrap_or_else(|| status.to_string())
}
