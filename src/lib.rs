//! pickwatch - retail pickup availability watcher
//!
//! Polls a retail fulfillment endpoint for a user-maintained list of
//! (product reference, location) pairs, tracks each item's pickup
//! availability, and notifies exactly once per transition into
//! "available".
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and the status enumeration
//! - [`store`] - Durable item store (the single source of truth)
//! - [`provider`] - Availability provider boundary and vendor client
//! - [`detector`] - Edge-triggered transition detection
//! - [`watcher`] - Polling loop with pacing and per-item isolation
//! - [`notifier`] - Best-effort notification channels
//! - [`api`] - Control API (CRUD over tracked items)
//! - [`commands`] - CLI entry points
//!
//! # Example
//!
//! ```no_run
//! use pickwatch::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     pickwatch::commands::run(config).await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod notifier;
pub mod provider;
pub mod store;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{CycleStats, ItemStatus, NotifyDecision, StoreAvailability, TrackedItem};
    pub use crate::notifier::{DisabledNotifier, Notifier, WebhookNotifier};
    pub use crate::provider::{AvailabilityProvider, FulfillmentProvider};
    pub use crate::store::ItemStore;
    pub use crate::watcher::Watcher;
}

// Direct re-exports for convenience
pub use models::{ItemStatus, TrackedItem};
