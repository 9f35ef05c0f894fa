//! Console configuration: where the device lives and how patiently to talk
//! to it.
//!
//! Values come from built-in defaults, optionally overlaid by a TOML file,
//! then by `MACROPAD_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the device API, including the `/api` prefix.
    pub device_url: String,
    /// Root under which mock payload files are served.
    pub mock_data_url: String,
    pub socket_url: String,
    pub request_timeout_ms: u64,
    /// Total dispatches per call, the first attempt included.
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub reconnect_interval_ms: u64,
    /// Substitute mock data after retries are exhausted.
    pub fallback_to_mock: bool,
    /// Initial "force mock" value when no `force_mock_file` is configured.
    pub force_mock: bool,
    pub force_mock_file: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            device_url: "http://localhost:8080/api".to_string(),
            mock_data_url: "http://localhost:8080/mock_data".to_string(),
            socket_url: "ws://localhost:8080/ws".to_string(),
            request_timeout_ms: 8000,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            reconnect_interval_ms: 3000,
            fallback_to_mock: true,
            force_mock: false,
            force_mock_file: None,
        }
    }
}

impl ConsoleConfig {
    /// Defaults, overlaid by `path` if given, then by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `MACROPAD_*` overrides; unparsable numeric values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MACROPAD_DEVICE_URL") {
            self.device_url = url;
        }
        if let Some(url) = lookup("MACROPAD_MOCK_DATA_URL") {
            self.mock_data_url = url;
        }
        if let Some(url) = lookup("MACROPAD_SOCKET_URL") {
            self.socket_url = url;
        }
        if let Some(ms) = lookup("MACROPAD_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.request_timeout_ms = ms;
        }
        if let Some(path) = lookup("MACROPAD_FORCE_MOCK_FILE") {
            self.force_mock_file = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("MACROPAD_FORCE_MOCK") {
            self.force_mock = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}
