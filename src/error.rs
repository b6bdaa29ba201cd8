//! Unified error handling for the pickwatch crate
//!
//! This module provides a unified error type that consolidates all
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own at module boundaries.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! The watcher relies on `is_recoverable()` to decide whether a failure
//! is local to one item (recovered by marking the item `Error` and
//! moving on) or fatal to the process (config, corrupt store file).

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::notifier::NotifyError;
pub use crate::provider::ProviderError;
pub use crate::store::StoreError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout)
    Network,
    /// Response decoding errors
    Decode,
    /// Durable storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the pickwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Availability provider errors (transport, timeout, decode)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Notification delivery errors
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// Item store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Check if this error is recoverable (the next cycle may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_recoverable(),
            Self::Notify(_) => true,
            Self::Store(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(_) => true,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Provider(ProviderError::Decode(_)) => ErrorCategory::Decode,
            Self::Provider(_) | Self::Notify(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Decode,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let err = Error::Provider(ProviderError::Timeout { secs: 20 });
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::Provider(ProviderError::Decode("bad payload".into()));
        assert_eq!(err.category(), ErrorCategory::Decode);

        let err = Error::config("missing provider url");
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Provider(ProviderError::Timeout { secs: 20 }).is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
        assert!(Error::Notify(NotifyError::Unavailable("down".into())).is_recoverable());
    }

    #[test]
    fn test_domain_error_conversion() {
        let unified: Error = ProviderError::Timeout { secs: 5 }.into();
        assert!(matches!(unified, Error::Provider(_)));

        let unified: Error = StoreError::DuplicateId(uuid::Uuid::new_v4()).into();
        assert!(matches!(unified, Error::Store(_)));
    }
}
