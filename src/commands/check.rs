//! `check` command: one-shot probe of every enabled item
//!
//! Prints a table of per-store answers without touching persisted
//! status, so a manual check never suppresses the watcher's next
//! notification.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::models::sort_for_display;
use crate::provider::{AvailabilityProvider, FulfillmentProvider};
use crate::store::ItemStore;

const ITEM_WIDTH: usize = 20;
const STORE_WIDTH: usize = 26;
const CITY_WIDTH: usize = 14;
const STATUS_WIDTH: usize = 12;

/// Probe all enabled items once and print the results
pub async fn check(config: Config) -> Result<()> {
    let store =
        ItemStore::open(&config.storage.items_path).context("Failed to open item store")?;
    let provider = FulfillmentProvider::new(config.provider.clone())
        .context("Failed to create availability provider")?;

    let items: Vec<_> = store
        .list()
        .await
        .into_iter()
        .filter(|i| i.enabled)
        .collect();
    if items.is_empty() {
        println!("No enabled items to check. Add items first.");
        return Ok(());
    }

    let header = format!(
        "{:ITEM_WIDTH$}  {:STORE_WIDTH$}  {:CITY_WIDTH$}  {:STATUS_WIDTH$}  Message",
        "Item", "Store", "City", "Status"
    );
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    let mut failures = 0usize;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(config.watcher.item_delay()).await;
        }

        match provider.probe(&item.external_ref, &item.location).await {
            Ok(mut stores) => {
                sort_for_display(&mut stores);
                if stores.is_empty() {
                    print_row(&item.display_name, "-", "-", "NO STORES", "");
                    continue;
                }
                for s in &stores {
                    let status = if s.available { "AVAILABLE" } else { "UNAVAILABLE" };
                    print_row(
                        &item.display_name,
                        s.store.as_deref().unwrap_or("-"),
                        s.city.as_deref().unwrap_or("-"),
                        status,
                        s.detail.as_deref().unwrap_or(""),
                    );
                }
            }
            Err(e) => {
                failures += 1;
                print_row(&item.display_name, "-", "-", "ERROR", &e.to_string());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} probes failed", items.len());
    }
    Ok(())
}

fn print_row(item: &str, store: &str, city: &str, status: &str, message: &str) {
    println!(
        "{:ITEM_WIDTH$}  {:STORE_WIDTH$}  {:CITY_WIDTH$}  {:STATUS_WIDTH$}  {}",
        truncate(item, ITEM_WIDTH),
        truncate(store, STORE_WIDTH),
        truncate(city, CITY_WIDTH),
        status,
        message
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
