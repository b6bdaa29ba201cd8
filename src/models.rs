//! Core data structures and types for pickwatch
//!
//! This module defines the canonical shapes shared across the crate:
//!
//! - [`ItemStatus`] - closed enumeration of pickup availability states
//! - [`TrackedItem`] - a (product reference, location) pair under watch
//! - [`StoreAvailability`] - one normalized per-store provider answer
//! - [`NotifyDecision`] - outcome of the transition detector
//! - [`CycleStats`] - per-cycle counters reported by the watcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Status Types
// ============================================================================

/// Canonical pickup availability status of a tracked item
///
/// Status values form a closed set; the provider boundary is the only
/// place where raw vendor strings are mapped into this enum. No other
/// component compares status as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Never probed successfully (freshly added items start here)
    Unknown,
    /// At least one store reported pickup availability
    Available,
    /// Probed successfully, no store reported availability
    Unavailable,
    /// Item is disabled; the watcher skips it without probing
    Disabled,
    /// Last probe failed (transport, timeout, or undecodable response)
    Error,
}

impl ItemStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Disabled => "disabled",
            Self::Error => "error",
        }
    }

    /// Whether this status participates in edge comparison
    ///
    /// `Error` observations are surfaced for display but must not move
    /// the edge the transition detector compares against.
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of comparing a fresh observation against the previous state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    /// Status transitioned into `Available`; dispatch one notification
    Notify,
    /// No transition into `Available`; stay quiet
    Hold,
}

impl NotifyDecision {
    /// Whether a notification should be dispatched
    pub fn should_notify(&self) -> bool {
        matches!(self, Self::Notify)
    }
}

// ============================================================================
// Tracked Item
// ============================================================================

/// A (product reference, location) pair the system monitors
///
/// Items are created through the control surface with status `Unknown`,
/// mutated each cycle by the watcher (status, message, timestamp), and
/// toggled or removed through the control surface. The item store is the
/// single source of truth; every field round-trips through persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Stable unique identifier, never derived from mutable fields
    pub id: Uuid,

    /// Free-text label shown in listings and notifications
    pub display_name: String,

    /// Opaque product identifier passed to the provider (e.g. SKU)
    pub external_ref: String,

    /// Opaque location token passed to the provider (e.g. postal code)
    pub location: String,

    /// Display-only product link included in notifications
    pub reference_link: String,

    /// Disabled items stay in the store but are never probed
    pub enabled: bool,

    /// Status observed on the last watcher pass
    #[serde(default)]
    pub last_status: ItemStatus,

    /// Last non-error status, used for edge comparison
    ///
    /// An `Error` cycle surfaces in `last_status` but leaves this field
    /// untouched, so a later real `Available` observation triggers only
    /// if the status before the error was not already `Available`.
    #[serde(default)]
    pub last_meaningful_status: ItemStatus,

    /// Human-readable detail of the last observation (store, city,
    /// distance, raw provider quote); informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,

    /// Timestamp of the last successful or failed probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl TrackedItem {
    /// Create a new enabled item with status `Unknown`
    pub fn new(
        display_name: impl Into<String>,
        external_ref: impl Into<String>,
        location: impl Into<String>,
        reference_link: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            external_ref: external_ref.into(),
            location: location.into(),
            reference_link: reference_link.into(),
            enabled: true,
            last_status: ItemStatus::Unknown,
            last_meaningful_status: ItemStatus::Unknown,
            last_message: None,
            last_checked_at: None,
        }
    }
}

// ============================================================================
// Provider Result Types
// ============================================================================

/// One normalized per-store availability answer from the provider
///
/// The provider maps whatever shape the vendor returns into this fixed
/// tuple type; unrecognized or missing fields become `None` rather than
/// errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreAvailability {
    /// Store label (name plus store number when both are known)
    pub store: Option<String>,

    /// Store city
    pub city: Option<String>,

    /// Distance from the requested location, in the vendor's units
    pub distance: Option<f64>,

    /// Whether the store reported the item as available for pickup
    pub available: bool,

    /// Raw provider quote, e.g. "Available today at Saket"
    pub detail: Option<String>,
}

impl StoreAvailability {
    /// Short display label for messages and the one-shot table
    pub fn label(&self) -> String {
        match (&self.store, &self.city) {
            (Some(store), Some(city)) => format!("{store}, {city}"),
            (Some(store), None) => store.clone(),
            (None, Some(city)) => city.clone(),
            (None, None) => String::from("unnamed store"),
        }
    }
}

/// Map a set of per-store answers to the canonical item status
///
/// Any store reporting availability wins; an empty answer means no
/// nearby store carries the item, which is `Unavailable` rather than an
/// error.
pub fn canonical_status(stores: &[StoreAvailability]) -> ItemStatus {
    if stores.iter().any(|s| s.available) {
        ItemStatus::Available
    } else {
        ItemStatus::Unavailable
    }
}

/// Sort provider answers for display: available stores first, then by
/// ascending distance
pub fn sort_for_display(stores: &mut [StoreAvailability]) {
    stores.sort_by(|a, b| {
        let rank = |s: &StoreAvailability| u8::from(!s.available);
        rank(a).cmp(&rank(b)).then_with(|| {
            let da = a.distance.unwrap_or(f64::MAX);
            let db = b.distance.unwrap_or(f64::MAX);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}

// ============================================================================
// Cycle Statistics
// ============================================================================

/// Counters accumulated over one full watcher pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Items probed this pass
    pub probed: usize,
    /// Items skipped because they are disabled
    pub skipped: usize,
    /// Items that ended the pass `Available`
    pub available: usize,
    /// Items that ended the pass `Unavailable`
    pub unavailable: usize,
    /// Items whose probe failed
    pub errors: usize,
    /// Notifications dispatched this pass
    pub notified: usize,
}

impl CycleStats {
    /// Record the outcome of a single probed item
    pub fn record(&mut self, status: ItemStatus) {
        self.probed += 1;
        match status {
            ItemStatus::Available => self.available += 1,
            ItemStatus::Unavailable => self.unavailable += 1,
            ItemStatus::Error => self.errors += 1,
            ItemStatus::Unknown | ItemStatus::Disabled => {}
        }
    }
}
