use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Address of the todo API when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000";

/// Environment variable that overrides `api.url`
pub const ENDPOINT_ENV: &str = "TODO_TUI_ENDPOINT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the API host)
  pub title: Option<String>,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_url")]
  pub url: String,
  /// Per-request timeout
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      timeout_secs: default_timeout(),
    }
  }
}

fn default_url() -> String {
  DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
  10
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when TODO_TUI_LOG is not set
  #[serde(default = "default_level")]
  pub level: String,
  /// Directory for the log file (defaults to the platform data dir)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      dir: None,
    }
  }
}

fn default_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./todo-tui.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/todo-tui/config.yaml
  ///
  /// Without a config file the defaults are used.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(ENDPOINT_ENV) {
      config.api.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("todo-tui.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("todo-tui").join("config.yaml");
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
    config.validate()?;
    Ok(config)
  }

  /// Check that the API url is usable
  pub fn validate(&self) -> Result<()> {
    let url = Url::parse(&self.api.url)
      .map_err(|e| eyre!("Invalid api.url {}: {}", self.api.url, e))?;

    match url.scheme() {
      "http" | "https" => Ok(()),
      other => Err(eyre!("Unsupported api.url scheme: {}", other)),
    }
  }

  /// Header title: configured title or the API host
  pub fn display_title(&self) -> String {
    self.title.clone().unwrap_or_else(|| {
      Url::parse(&self.api.url)
        .ok()
        .and_then(|u| {
          u.host_str()
            .map(|h| match u.port() {
              Some(port) => format!("{}:{}", h, port),
              None => h.to_string(),
            })
        })
        .unwrap_or_else(|| self.api.url.clone())
    })
  }

  /// Directory the log file is written to
  pub fn log_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.log.dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("todo-tui"))
  }
}
