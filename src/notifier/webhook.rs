//! Webhook notification channel
//!
//! Sends messages as JSON payloads via HTTP POST. The payload shape
//! (`{"text": "..."}`) is accepted as-is by most chat webhook services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Notifier, NotifyError, NotifyResult};

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,

    /// Optional authentication token (sent as Bearer token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let parsed =
            url::Url::parse(&self.url).map_err(|e| format!("Webhook URL is invalid: {e}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("Webhook URL must use http or https".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Webhook notification channel
#[derive(Debug)]
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// Create a new webhook notifier
    pub fn new(config: WebhookConfig) -> NotifyResult<Self> {
        config.validate().map_err(NotifyError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create a webhook notifier from just a URL
    pub fn from_url(url: impl Into<String>) -> NotifyResult<Self> {
        Self::new(WebhookConfig::new(url))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, message: &str) -> NotifyResult<()> {
        let mut request = self
            .client
            .post(self.config.url.as_str())
            .json(&serde_json::json!({ "text": message }));

        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        tracing::debug!(url = %self.config.url, "Notification delivered");
        Ok(())
    }
}
