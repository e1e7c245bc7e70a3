//! Configuration file support

use rag_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for ragc
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root, e.g. "http://localhost:5001/api"
    pub api_base_url: Option<String>,
    /// Timeout for REST calls, in seconds
    pub request_timeout_secs: Option<u64>,
    /// Budget for recovering an expired session, in seconds
    pub refresh_timeout_secs: Option<u64>,
    /// Token store shared by every ragc process
    pub storage_path: Option<String>,
    /// Pause after a streamed answer before it is treated as final
    pub completion_delay_ms: Option<u64>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ragconsole")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RAGCONSOLE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            api_base_url: Some(ClientConfig::default().base_url),
            request_timeout_secs: Some(300),
            refresh_timeout_secs: Some(100),
            storage_path: None,
            completion_delay_ms: Some(1000),
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    /// API root, with `RAGCONSOLE_API_URL` taking precedence
    pub fn api_base_url(&self) -> String {
        std::env::var("RAGCONSOLE_API_URL")
            .ok()
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| ClientConfig::default().base_url)
    }

    /// Where access and refresh tokens are kept
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_path {
            Some(path) => PathBuf::from(path),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ragconsole")
                .join("storage.json"),
        }
    }

    pub fn completion_delay(&self) -> Duration {
        self.completion_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(rag_chat::StreamMessage::DEFAULT_COMPLETION_DELAY)
    }

    /// Client settings for the given API root
    pub fn client_config(&self, base_url: String) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            refresh_timeout: self
                .refresh_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_timeout),
            ..ClientConfig::new(base_url)
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# ragc configuration file
# Place at ~/.config/ragconsole/config.toml (Linux) or set RAGCONSOLE_CONFIG_PATH

# Console API root (RAGCONSOLE_API_URL overrides this)
api_base_url = "http://localhost:5001/api"

# Timeout for regular API calls, in seconds
request_timeout_secs = 300

# How long to wait for an expired session to be renewed, in seconds
refresh_timeout_secs = 100

# Token store shared by every ragc process (optional)
# storage_path = "~/.local/share/ragconsole/storage.json"

# Pause after a streamed answer before it is treated as final, in milliseconds
completion_delay_ms = 1000
"#
}
