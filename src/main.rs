mod api;
mod app;
mod commands;
mod config;
mod event;
mod logging;
mod query;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "todo-tui")]
#[command(about = "A terminal client for a todo-list REST API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./todo-tui.yaml or $XDG_CONFIG_HOME/todo-tui/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the todo API (overrides api.url and TODO_TUI_ENDPOINT)
  #[arg(short, long)]
  endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override endpoint if specified on command line
  if let Some(endpoint) = args.endpoint {
    config.api.url = endpoint;
  }
  config.validate()?;

  let _log_guard = logging::init(&config)?;
  info!(endpoint = %config.api.url, "starting todo-tui");

  // Initialize and run the app
  let mut app = app::App::new(&config)?;
  app.run().await?;

  Ok(())
}
