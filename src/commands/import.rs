//! `import` command: seed tracked items from a plain text file
//!
//! One product reference per line; blank lines and `#` comments are
//! skipped. References already tracked at the same location are not
//! duplicated.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::TrackedItem;
use crate::store::ItemStore;

/// Add every reference in `file` as an enabled item at `location`
pub async fn import(config: Config, file: &Path, location: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;

    let store =
        ItemStore::open(&config.storage.items_path).context("Failed to open item store")?;
    let mut seen: std::collections::HashSet<String> = store
        .list()
        .await
        .into_iter()
        .filter(|i| i.location == location)
        .map(|i| i.external_ref)
        .collect();

    let mut added = 0usize;
    let mut skipped = 0usize;
    for line in raw.lines() {
        let external_ref = line.trim();
        if external_ref.is_empty() || external_ref.starts_with('#') {
            continue;
        }

        if !seen.insert(external_ref.to_string()) {
            tracing::debug!(external_ref, "Already tracked at this location; skipped");
            skipped += 1;
            continue;
        }

        store
            .add(TrackedItem::new(external_ref, external_ref, location, ""))
            .await
            .context("Failed to add imported item")?;
        added += 1;
    }

    println!("Imported {added} item(s), skipped {skipped} duplicate(s).");
    Ok(())
}
