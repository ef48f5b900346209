//! File-backed tracing setup. The terminal belongs to the UI, so logs go to
//! $XDG_DATA_HOME/eqtrack/eqtrack.log instead of stderr.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "eqtrack.log";

/// Install the global subscriber.
///
/// The filter comes from `level` if given, else EQTRACK_LOG, else `info`.
/// Keep the returned guard alive for the lifetime of the program or buffered
/// records are lost on exit.
pub fn init(level: Option<&str>) -> Result<WorkerGuard> {
  let dir = log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let filter = match level {
    Some(level) => EnvFilter::try_new(level)?,
    None => EnvFilter::try_from_env("EQTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
  };

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}

fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("eqtrack"))
}
