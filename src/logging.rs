//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a filter directive, e.g. `todo_tui=debug`
pub const LOG_ENV: &str = "TODO_TUI_LOG";

pub const LOG_FILE: &str = "todo-tui.log";

/// Install the global subscriber writing to `<log dir>/todo-tui.log`.
///
/// Keep the returned guard alive until exit; dropping it flushes the writer.
pub fn init(config: &Config) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter(&config.log.level)?)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}

/// `TODO_TUI_LOG` when set, else the configured level
fn filter(level: &str) -> Result<EnvFilter> {
  match std::env::var(LOG_ENV) {
    Ok(directive) => EnvFilter::try_new(&directive)
      .map_err(|e| eyre!("Invalid {} directive {}: {}", LOG_ENV, directive, e)),
    Err(_) => EnvFilter::try_new(level)
      .map_err(|e| eyre!("Invalid log.level {}: {}", level, e)),
  }
}
