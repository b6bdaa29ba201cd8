//! Durable item store
//!
//! The store owns the list of tracked items and is the single source of
//! truth shared by the watcher loop and the control API. All access goes
//! through its atomic operations; no other component keeps a copy of
//! item state across cycles.
//!
//! # Persistence
//!
//! Items are kept in a single JSON file. Every mutation rewrites the
//! file through a temp-file-plus-rename, so an interrupted write never
//! corrupts previously committed records. Mutations are applied to a
//! working copy first and committed to memory only after the file write
//! succeeds, which keeps the in-memory view identical to disk even when
//! a write fails mid-cycle.
//!
//! # Concurrency
//!
//! A `tokio::sync::RwLock` serializes writes and lets readers observe a
//! consistent snapshot. Mutations on an unknown id return `Ok(false)`
//! and leave the store untouched.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ItemStatus, TrackedItem};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the durable item store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed
    #[error("Item store I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store file exists but does not decode
    #[error("Item store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// An item with this id is already present
    #[error("Duplicate item id: {0}")]
    DuplicateId(Uuid),
}

impl StoreError {
    /// Whether a later attempt may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::Corrupt(_) => false,
            Self::DuplicateId(_) => false,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Item Store
// ============================================================================

/// Durable CRUD over the list of tracked items
pub struct ItemStore {
    /// Path of the JSON file backing the store
    path: PathBuf,

    /// In-memory view, always identical to the last committed file state
    items: RwLock<Vec<TrackedItem>>,
}

impl ItemStore {
    /// Open a store, loading existing items from `path`
    ///
    /// A missing file is an empty store, not an error; the file is
    /// created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let items = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        tracing::debug!(path = %path.display(), count = items.len(), "Item store opened");
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Snapshot of all tracked items
    pub async fn list(&self) -> Vec<TrackedItem> {
        self.items.read().await.clone()
    }

    /// Look up a single item by id
    pub async fn get(&self, id: Uuid) -> Option<TrackedItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Number of items, enabled or not
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the store holds no items
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Add a new item, returning its id
    pub async fn add(&self, item: TrackedItem) -> StoreResult<Uuid> {
        let mut guard = self.items.write().await;
        if guard.iter().any(|i| i.id == item.id) {
            return Err(StoreError::DuplicateId(item.id));
        }

        let id = item.id;
        let mut next = guard.clone();
        next.push(item);
        self.persist(&next)?;
        *guard = next;

        tracing::info!(%id, "Item added to store");
        Ok(id)
    }

    /// Remove an item; `Ok(false)` when the id is unknown
    pub async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let mut guard = self.items.write().await;
        let mut next = guard.clone();
        let before = next.len();
        next.retain(|i| i.id != id);
        if next.len() == before {
            return Ok(false);
        }

        self.persist(&next)?;
        *guard = next;

        tracing::info!(%id, "Item removed from store");
        Ok(true)
    }

    /// Enable or disable an item; `Ok(false)` when the id is unknown
    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> StoreResult<bool> {
        self.mutate(id, |item| item.enabled = enabled).await
    }

    /// Record a fresh observation for an item
    ///
    /// Sets status, detail message, and probe timestamp. The meaningful
    /// status used for edge comparison only advances on non-error
    /// observations. `Ok(false)` when the id is unknown (e.g. removed
    /// while a cycle was in flight).
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ItemStatus,
        message: Option<String>,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.mutate(id, |item| {
            item.last_status = status;
            if status.is_meaningful() {
                item.last_meaningful_status = status;
            }
            item.last_message = message;
            item.last_checked_at = Some(checked_at);
        })
        .await
    }

    /// Apply a closure to one item and persist; `Ok(false)` on unknown id
    async fn mutate<F>(&self, id: Uuid, f: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut TrackedItem),
    {
        let mut guard = self.items.write().await;
        let mut next = guard.clone();
        let Some(item) = next.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        f(item);

        self.persist(&next)?;
        *guard = next;
        Ok(true)
    }

    /// Write the full item list through a temp file, then rename
    fn persist(&self, items: &[TrackedItem]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(items)?;
        std::fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), count = items.len(), "Item store persisted");
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ItemStore {
        ItemStore::open(dir.path().join("items.json")).unwrap()
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store
            .add(TrackedItem::new("iPhone", "MPXV3HN/A", "110001", "https://x"))
            .await
            .unwrap();

        let items = store.list().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].external_ref, "MPXV3HN/A");
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .add(TrackedItem::new("a", "SKU1", "Z1", "https://x"))
            .await
            .unwrap();

        let removed = store.remove(Uuid::new_v4()).await.unwrap();
        assert!(!removed);
        assert_eq!(store.len().await, 1);

        // Removing twice is safe
        let removed = store.remove(Uuid::new_v4()).await.unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = store
            .add(TrackedItem::new("a", "SKU1", "Z1", "https://x"))
            .await
            .unwrap();

        assert!(store.set_enabled(id, false).await.unwrap());
        assert!(!store.get(id).await.unwrap().enabled);

        assert!(!store.set_enabled(Uuid::new_v4(), false).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_tracks_meaningful() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = store
            .add(TrackedItem::new("a", "SKU1", "Z1", "https://x"))
            .await
            .unwrap();

        store
            .update_status(id, ItemStatus::Available, Some("in stock".into()), Utc::now())
            .await
            .unwrap();
        let item = store.get(id).await.unwrap();
        assert_eq!(item.last_status, ItemStatus::Available);
        assert_eq!(item.last_meaningful_status, ItemStatus::Available);

        // An error observation surfaces but does not move the edge
        store
            .update_status(id, ItemStatus::Error, Some("timeout".into()), Utc::now())
            .await
            .unwrap();
        let item = store.get(id).await.unwrap();
        assert_eq!(item.last_status, ItemStatus::Error);
        assert_eq!(item.last_meaningful_status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");

        let id;
        {
            let store = ItemStore::open(&path).unwrap();
            id = store
                .add(TrackedItem::new("iPad", "MK2K3HN/A", "560001", "https://x"))
                .await
                .unwrap();
            store.set_enabled(id, false).await.unwrap();
            store
                .update_status(id, ItemStatus::Unavailable, None, Utc::now())
                .await
                .unwrap();
        }

        let store = ItemStore::open(&path).unwrap();
        let items = store.list().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert!(!items[0].enabled);
        assert_eq!(items[0].last_status, ItemStatus::Unavailable);
        assert_eq!(items[0].last_meaningful_status, ItemStatus::Unavailable);
        assert!(items[0].last_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let item = TrackedItem::new("a", "SKU1", "Z1", "https://x");
        let dup = item.clone();

        store.add(item).await.unwrap();
        let err = store.add(dup).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
        assert_eq!(store.len().await, 1);
    }
}
