//! Polling loop and scheduler
//!
//! The watcher is the only component that talks to the availability
//! provider and the notifier. Each cycle it takes a snapshot of the item
//! store, walks it with isolated per-item error handling, runs the
//! transition detector, dispatches notifications, and persists every
//! observation back through the store's atomic operations.
//!
//! # Pacing and liveness
//!
//! A fixed inter-item delay spaces probes out, and a fixed inter-cycle
//! delay separates passes; both come from [`WatcherConfig`] and are
//! process-wide. Provider and notifier calls are bounded by their own
//! client timeouts, so a hanging store cannot stall the pass beyond one
//! timeout. A failure on one item never aborts the cycle for the rest.
//!
//! # Shutdown
//!
//! The loop is externally stoppable through a `tokio::sync::watch`
//! channel checked between items and during every delay, so shutdown
//! latency is one in-flight probe at worst. Interrupting a cycle cannot
//! corrupt durable state: each item's persistence is an independent
//! atomic write.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::WatcherConfig;
use crate::detector;
use crate::models::{
    canonical_status, sort_for_display, CycleStats, ItemStatus, StoreAvailability, TrackedItem,
};
use crate::notifier::Notifier;
use crate::provider::AvailabilityProvider;
use crate::store::ItemStore;

// ============================================================================
// Shutdown Handle
// ============================================================================

/// Handle for stopping a running watcher from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request shutdown; idempotent
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

// ============================================================================
// Watcher
// ============================================================================

/// The polling loop over tracked items
pub struct Watcher {
    store: Arc<ItemStore>,
    provider: Arc<dyn AvailabilityProvider>,
    notifier: Arc<dyn Notifier>,
    config: WatcherConfig,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Watcher {
    /// Create a new watcher
    pub fn new(
        store: Arc<ItemStore>,
        provider: Arc<dyn AvailabilityProvider>,
        notifier: Arc<dyn Notifier>,
        config: WatcherConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            store,
            provider,
            notifier,
            config,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Handle other tasks use to stop the loop
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Run cycles until shutdown is requested
    pub async fn run(mut self) {
        tracing::info!(
            item_delay_secs = self.config.item_delay_secs,
            cycle_delay_secs = self.config.cycle_delay_secs,
            provider = self.provider.name(),
            notifier = self.notifier.name(),
            "Watcher starting"
        );

        loop {
            let stats = self.run_cycle().await;
            tracing::info!(
                probed = stats.probed,
                available = stats.available,
                unavailable = stats.unavailable,
                errors = stats.errors,
                skipped = stats.skipped,
                notified = stats.notified,
                "Cycle complete"
            );

            if self.wait_or_shutdown(self.config.cycle_delay()).await {
                break;
            }
        }

        tracing::info!("Watcher stopped");
    }

    /// Run one full pass over the current item snapshot
    ///
    /// Public so the one-shot command and tests can drive single cycles
    /// without the outer loop.
    pub async fn run_cycle(&mut self) -> CycleStats {
        let snapshot = self.store.list().await;
        let mut stats = CycleStats::default();
        let mut probed_before = false;

        for item in snapshot {
            if self.is_shutdown() {
                break;
            }

            if !item.enabled {
                self.skip_disabled(&item, &mut stats).await;
                continue;
            }

            // Inter-item spacing between consecutive probes
            if probed_before && self.wait_or_shutdown(self.config.item_delay()).await {
                break;
            }
            probed_before = true;

            self.process_item(&item, &mut stats).await;
        }

        stats
    }

    /// Mark a disabled item without probing or notifying
    async fn skip_disabled(&self, item: &TrackedItem, stats: &mut CycleStats) {
        stats.skipped += 1;
        if item.last_status == ItemStatus::Disabled {
            return;
        }
        self.persist(item, ItemStatus::Disabled, Some(String::from("Tracking disabled")))
            .await;
    }

    /// Probe one item, detect transitions, notify, persist
    async fn process_item(&self, item: &TrackedItem, stats: &mut CycleStats) {
        let (status, message) = match self
            .provider
            .probe(&item.external_ref, &item.location)
            .await
        {
            Ok(mut stores) => {
                sort_for_display(&mut stores);
                (canonical_status(&stores), Some(observation_message(&stores)))
            }
            Err(e) => {
                tracing::warn!(
                    item = %item.display_name,
                    external_ref = %item.external_ref,
                    error = %e,
                    "Probe failed; marking item as error"
                );
                (ItemStatus::Error, Some(e.to_string()))
            }
        };
        stats.record(status);

        if detector::decide(item.last_meaningful_status, status).should_notify() {
            self.dispatch_notification(item, message.as_deref()).await;
            stats.notified += 1;
        }

        // Persisted regardless of notifier outcome
        self.persist(item, status, message).await;
    }

    /// Best-effort notification; failure is logged, never escalated
    async fn dispatch_notification(&self, item: &TrackedItem, detail: Option<&str>) {
        let mut message = format!(
            "{} is available for pickup ({} @ {})",
            item.display_name, item.external_ref, item.location
        );
        if let Some(detail) = detail {
            message.push_str(&format!("\n{detail}"));
        }
        if !item.reference_link.is_empty() {
            message.push_str(&format!("\n{}", item.reference_link));
        }

        match self.notifier.notify(&message).await {
            Ok(()) => {
                tracing::info!(item = %item.display_name, "Notification dispatched");
            }
            Err(e) => {
                tracing::warn!(
                    item = %item.display_name,
                    channel = self.notifier.name(),
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }

    /// Write one observation through the store
    async fn persist(&self, item: &TrackedItem, status: ItemStatus, message: Option<String>) {
        match self
            .store
            .update_status(item.id, status, message, Utc::now())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // Removed through the control surface while this cycle
                // was in flight; nothing to update.
                tracing::debug!(id = %item.id, "Item vanished mid-cycle");
            }
            Err(e) => {
                tracing::error!(
                    id = %item.id,
                    error = %e,
                    "Failed to persist observation; will recompute next cycle"
                );
            }
        }
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Sleep for `delay`, returning true if shutdown arrived first
    async fn wait_or_shutdown(&mut self, delay: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.shutdown_rx.changed() => true,
        }
    }
}

/// Human-readable summary of one probe's answers
///
/// Uses the best store (available first, nearest first) as the headline.
pub fn observation_message(stores: &[StoreAvailability]) -> String {
    match stores.first() {
        None => String::from("No nearby stores reported"),
        Some(best) => {
            let mut parts = vec![best.label()];
            if let Some(distance) = best.distance {
                parts.push(format!("{distance:.1} away"));
            }
            if let Some(detail) = &best.detail {
                parts.push(detail.clone());
            }
            parts.join(", ")
        }
    }
}
