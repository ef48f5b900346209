mod app;
mod backend;
mod cache;
mod config;
mod event;
mod logging;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "eqtrack")]
#[command(about = "A terminal UI for browsing and annotating tracked equipment")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/eqtrack/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log filter, e.g. "debug" or "eqtrack=trace" (overrides EQTRACK_LOG)
  #[arg(long)]
  log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = logging::init(args.log_level.as_deref())?;

  let config = config::Config::load(args.config.as_deref())?;
  info!(url = %config.backend.url, "configuration loaded");

  let mut app = app::App::new(config).await?;
  app.run().await?;

  Ok(())
}
