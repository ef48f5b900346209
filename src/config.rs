use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  /// Custom title for header (defaults to backend host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Project URL, e.g. https://abcd.supabase.co
  pub url: String,
  /// Public (anon) API key. Falls back to EQTRACK_ANON_KEY when omitted.
  pub anon_key: Option<String>,
  #[serde(default = "default_equipment_table")]
  pub equipment_table: String,
  #[serde(default = "default_logs_table")]
  pub logs_table: String,
  #[serde(default = "default_profiles_table")]
  pub profiles_table: String,
}

fn default_equipment_table() -> String {
  "equipment".to_string()
}

fn default_logs_table() -> String {
  "equipment_logs".to_string()
}

fn default_profiles_table() -> String {
  "profiles".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached entry reads as a miss. 0 keeps entries for the session.
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
  300
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Option<Duration> {
    match self.ttl_secs {
      0 => None,
      secs => Some(Duration::from_secs(secs)),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./eqtrack.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/eqtrack/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/eqtrack/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("eqtrack.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("eqtrack").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Get the public API key, preferring the config file over EQTRACK_ANON_KEY.
  pub fn anon_key(&self) -> Result<String> {
    if let Some(key) = &self.backend.anon_key {
      return Ok(key.clone());
    }
    std::env::var("EQTRACK_ANON_KEY").map_err(|_| {
      eyre!("Backend API key not found. Set backend.anon_key or the EQTRACK_ANON_KEY environment variable.")
    })
  }

  /// Get the signed-in user's access token from EQTRACK_ACCESS_TOKEN.
  ///
  /// Without one, requests run as the anonymous role and editing is disabled.
  pub fn access_token() -> Option<String> {
    std::env::var("EQTRACK_ACCESS_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
