//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: where
//! the auth authority lives, which backend holds the token slot, and how
//! often the session watcher ticks.
//!
//! Configuration is stored at `~/.config/amc-session/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "amc-session";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "AMC_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Liveness checks run every 5 seconds while a session is being watched.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 5;

/// 30s allows for slow responses while failing fast enough for the next tick.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the credential slot is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub store: StoreBackend,
    pub check_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            store: StoreBackend::default(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
    }

    pub fn check_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed token slot
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store, StoreBackend::File);
        assert_eq!(config.check_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_url":"https://api.example.com","store":"keyring"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.store, StoreBackend::Keyring);
        assert_eq!(config.check_interval_secs, 5);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = Config {
            check_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.check_interval(), Duration::from_secs(1));
    }
}
