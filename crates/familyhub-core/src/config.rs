//! Application configuration management.
//!
//! Holds the data service URL, polling window, retry policy and focus
//! session length. Stored at `~/.config/familyhub/config.json`; a missing
//! file means defaults. `FAMILYHUB_API_URL` overrides the stored URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::RetryPolicy;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "familyhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "FAMILYHUB_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Seconds between dashboard refreshes.
    pub poll_interval_secs: u64,
    /// How long a dashboard keeps polling after it starts.
    pub poll_duration_secs: u64,
    pub retry: RetrySettings,
    pub focus_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_secs: 30,
            poll_duration_secs: 600,
            retry: RetrySettings::default(),
            focus_minutes: 25,
        }
    }
}

impl Config {
    /// Load from the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.max_delay_ms),
        )
        .context("Invalid retry settings")
    }

    /// `(interval, total duration)` for the dashboard poller.
    pub fn poll_settings(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.poll_duration_secs),
        )
    }

    pub fn focus_seconds(&self) -> u32 {
        self.focus_minutes.saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retry_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn test_written_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            api_base_url: "https://family.example.test/api".into(),
            poll_interval_secs: 5,
            ..Config::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(
            reloaded.poll_settings(),
            (Duration::from_secs(5), Duration::from_secs(600))
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"focus_minutes": 50, "retry": {"max_attempts": 5}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.focus_seconds(), 3000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn test_invalid_retry_settings_rejected() {
        let config = Config {
            retry: RetrySettings {
                max_attempts: 0,
                ..RetrySettings::default()
            },
            ..Config::default()
        };
        assert!(config.retry_policy().is_err());
    }
}
