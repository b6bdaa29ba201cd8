//! Availability provider boundary
//!
//! The watcher talks to the outside world through the
//! [`AvailabilityProvider`] trait: given an opaque product reference and
//! location token, a provider answers with zero or more normalized
//! per-store availability entries, or fails with a [`ProviderError`].
//!
//! Everything vendor-specific (endpoint, query shape, response decode,
//! availability synonyms) lives behind this trait. The rest of the crate
//! only ever sees [`StoreAvailability`] values and the canonical status
//! enum.

pub mod fulfillment;

use async_trait::async_trait;

use crate::models::StoreAvailability;

// Re-exports
pub use fulfillment::{FulfillmentProvider, ProviderConfig};

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while probing the external availability source
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request did not complete within the configured timeout
    #[error("Probe timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source answered with a non-success status code
    #[error("Source returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not decodable in any recognized shape
    #[error("Undecodable response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether the next cycle's probe may succeed without intervention
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Status(code) => code.is_server_error(),
            Self::Decode(_) => false,
        }
    }
}

/// External source of pickup availability answers
///
/// Implementations must be cheap to share across tasks; the watcher
/// holds one instance behind an `Arc` for the lifetime of the process.
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Query availability for one (product reference, location) pair
    ///
    /// Returns one entry per candidate fulfillment store, already
    /// filtered to the requested reference. An empty vector means no
    /// nearby store reported the item; it is not an error.
    async fn probe(
        &self,
        external_ref: &str,
        location: &str,
    ) -> ProviderResult<Vec<StoreAvailability>>;
}
