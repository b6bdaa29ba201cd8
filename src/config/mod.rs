//! Configuration management for pickwatch
//!
//! Configuration is loaded from an optional TOML file and then
//! overridden by `PICKWATCH_*` environment variables. Every section has
//! workable defaults so the watcher starts with nothing but a store
//! path.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::notifier::WebhookConfig;
use crate::provider::ProviderConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Durable storage configuration
    pub storage: StorageConfig,

    /// Availability provider configuration
    pub provider: ProviderConfig,

    /// Watcher pacing configuration
    pub watcher: WatcherConfig,

    /// Notification channel configuration (absent = disabled)
    pub notifier: NotifierConfig,

    /// Control API server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON file holding tracked items
    pub items_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            items_path: PathBuf::from("data/items.json"),
        }
    }
}

/// Watcher pacing configuration
///
/// Both delays exist to keep load on the external source flat; they are
/// process-wide parameters, never per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Delay between probes of consecutive items, in seconds
    pub item_delay_secs: u64,

    /// Delay between full passes over the item list, in seconds
    pub cycle_delay_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            item_delay_secs: 5,
            cycle_delay_secs: 300,
        }
    }
}

impl WatcherConfig {
    /// Inter-item spacing as a Duration
    pub fn item_delay(&self) -> Duration {
        Duration::from_secs(self.item_delay_secs)
    }

    /// Inter-cycle spacing as a Duration
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.cycle_delay_secs)
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Webhook channel; `None` disables notifications
    pub webhook: Option<WebhookConfig>,
}

/// Control API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the control API binds to
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8780".parse().expect("valid default bind addr"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply env overrides
    ///
    /// A missing file yields defaults; a present but malformed file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new("pickwatch.toml"));
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override selected fields from `PICKWATCH_*` environment variables
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("PICKWATCH_ITEMS_PATH") {
            self.storage.items_path = v.into();
        }
        if let Ok(v) = std::env::var("PICKWATCH_PROVIDER_URL") {
            self.provider.base_url = v;
        }
        if let Some(v) = env_parse::<u64>("PICKWATCH_PROVIDER_TIMEOUT") {
            self.provider.timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("PICKWATCH_ITEM_DELAY") {
            self.watcher.item_delay_secs = v;
        }
        if let Some(v) = env_parse::<u64>("PICKWATCH_CYCLE_DELAY") {
            self.watcher.cycle_delay_secs = v;
        }
        if let Ok(v) = std::env::var("PICKWATCH_WEBHOOK_URL") {
            let token = std::env::var("PICKWATCH_WEBHOOK_TOKEN").ok();
            let mut webhook = WebhookConfig::new(v);
            if let Some(token) = token {
                webhook = webhook.with_auth_token(token);
            }
            self.notifier.webhook = Some(webhook);
        }
        if let Some(v) = env_parse::<SocketAddr>("PICKWATCH_BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("PICKWATCH_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Validate the assembled configuration
    pub fn validate(&self) -> Result<()> {
        self.provider
            .validate()
            .map_err(|e| anyhow::anyhow!("provider: {e}"))?;
        if let Some(webhook) = &self.notifier.webhook {
            webhook
                .validate()
                .map_err(|e| anyhow::anyhow!("notifier.webhook: {e}"))?;
        }
        if self.storage.items_path.as_os_str().is_empty() {
            anyhow::bail!("storage.items_path cannot be empty");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
