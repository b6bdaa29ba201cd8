//! Control API for tracked items
//!
//! A thin CRUD layer over the item store: list, add, remove, and toggle
//! tracked items, plus a health endpoint. The API never talks to the
//! provider or the notifier and never duplicates watcher logic; status
//! shown in listings is whatever the watcher last wrote through the
//! store, so reads are eventually consistent within one cycle interval
//! and never block on a probe.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::models::TrackedItem;
use crate::store::ItemStore;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single source of truth for tracked items
    pub store: Arc<ItemStore>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state over an open store
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub item_count: usize,
}

/// Request body for adding an item
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub display_name: String,
    pub external_ref: String,
    pub location: String,
    #[serde(default)]
    pub reference_link: String,
}

// ============================================================================
// Router
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/items", get(list_items).post(add_item))
        .route("/api/items/{id}", axum::routing::delete(remove_item))
        .route("/api/items/{id}/toggle", post(toggle_item))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

/// Serve the API until the shutdown future resolves
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Control API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Control API shutdown complete");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: String::from("ok"),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        item_count: state.store.len().await,
    };
    Json(ApiResponse::success(response))
}

async fn list_items(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.store.list().await;
    Json(ApiResponse::success(items))
}

async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> impl IntoResponse {
    if request.display_name.trim().is_empty() || request.external_ref.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<TrackedItem>::error(
                "display_name and external_ref are required",
            )),
        );
    }

    let item = TrackedItem::new(
        request.display_name.trim(),
        request.external_ref.trim(),
        request.location.trim(),
        request.reference_link.trim(),
    );
    let stored = item.clone();

    match state.store.add(item).await {
        Ok(_) => (StatusCode::CREATED, Json(ApiResponse::success(stored))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to add item");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            )
        }
    }
}

async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.remove(id).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success(id))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No item with id {id}"))),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to remove item");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            )
        }
    }
}

async fn toggle_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(item) = state.store.get(id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<TrackedItem>::error(format!(
                "No item with id {id}"
            ))),
        );
    };

    match state.store.set_enabled(id, !item.enabled).await {
        Ok(true) => {
            // The watcher picks the flag up on its next snapshot; no
            // restart needed.
            let updated = state.store.get(id).await;
            match updated {
                Some(item) => (StatusCode::OK, Json(ApiResponse::success(item))),
                None => (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(format!("No item with id {id}"))),
                ),
            }
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No item with id {id}"))),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to toggle item");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            )
        }
    }
}
