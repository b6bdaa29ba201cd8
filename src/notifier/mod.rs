//! Notification delivery boundary
//!
//! The watcher hands finished messages to a [`Notifier`]; delivery is
//! best effort. A failed delivery is logged and dropped, never retried
//! within the cycle — the next real transition produces the next
//! attempt.
//!
//! When no notifier is configured the watcher runs with the
//! [`DisabledNotifier`], which accepts every message and does nothing.
//! Missing credentials are a capability downgrade, not an error.

pub mod webhook;

use async_trait::async_trait;

// Re-exports
pub use webhook::{WebhookConfig, WebhookNotifier};

/// Result type for notifier operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors raised while delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The channel answered with a non-success status code
    #[error("Channel returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Channel temporarily unavailable
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort outbound message channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &str;

    /// Deliver one free-text message
    async fn notify(&self, message: &str) -> NotifyResult<()>;
}

/// No-op notifier used when no channel is configured
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn notify(&self, message: &str) -> NotifyResult<()> {
        tracing::debug!(message, "Notifications disabled; message dropped");
        Ok(())
    }
}
