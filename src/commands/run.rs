//! `run` command: watcher loop plus control API until ctrl-c

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::notifier::{DisabledNotifier, Notifier, WebhookNotifier};
use crate::provider::FulfillmentProvider;
use crate::store::ItemStore;
use crate::watcher::Watcher;

/// Start the watcher and the control API, stop both on ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let store = Arc::new(
        ItemStore::open(&config.storage.items_path).context("Failed to open item store")?,
    );
    tracing::info!(
        path = %config.storage.items_path.display(),
        items = store.len().await,
        "Item store loaded"
    );

    let provider = Arc::new(
        FulfillmentProvider::new(config.provider.clone())
            .context("Failed to create availability provider")?,
    );

    // Absent notifier credentials downgrade capability, logged once
    let notifier: Arc<dyn Notifier> = match &config.notifier.webhook {
        Some(webhook) => Arc::new(
            WebhookNotifier::new(webhook.clone()).context("Failed to create webhook notifier")?,
        ),
        None => {
            tracing::warn!("No notifier configured; running without notifications");
            Arc::new(DisabledNotifier)
        }
    };

    let watcher = Watcher::new(
        store.clone(),
        provider,
        notifier,
        config.watcher.clone(),
    );
    let shutdown = watcher.shutdown_handle();
    let watcher_task = tokio::spawn(watcher.run());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        shutdown.shutdown();
        let _ = stop_tx.send(());
    });

    api::serve(AppState::new(store), config.server.bind, async move {
        let _ = stop_rx.await;
    })
    .await?;

    watcher_task.await.context("Watcher task panicked")?;
    Ok(())
}
