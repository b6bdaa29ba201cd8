//! Control API tests driven through the router without a socket

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use pickwatch::api::{create_router, AppState};
use pickwatch::models::TrackedItem;
use pickwatch::store::ItemStore;

struct Fixture {
    store: Arc<ItemStore>,
    router: axum::Router,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ItemStore::open(dir.path().join("items.json")).unwrap());
    let router = create_router(AppState::new(store.clone()));
    Fixture {
        store,
        router,
        _dir: dir,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_reports_item_count() {
    let f = fixture();
    let response = f
        .router
        .oneshot(empty_request("GET", "/api/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["item_count"], 0);
}

#[tokio::test]
async fn add_then_list_items() {
    let f = fixture();

    let response = f
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/items",
            serde_json::json!({
                "display_name": "iPhone 15 Pro",
                "external_ref": "MPXV3HN/A",
                "location": "110001",
                "reference_link": "https://example.com/iphone"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["enabled"], true);
    assert_eq!(created["data"]["last_status"], "unknown");

    let response = f
        .router
        .oneshot(empty_request("GET", "/api/items"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["external_ref"], "MPXV3HN/A");

    // Durable behind the API
    assert_eq!(f.store.len().await, 1);
}

#[tokio::test]
async fn add_rejects_blank_fields() {
    let f = fixture();
    let response = f
        .router
        .oneshot(json_request(
            "POST",
            "/api/items",
            serde_json::json!({
                "display_name": "  ",
                "external_ref": "",
                "location": "110001"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(f.store.is_empty().await);
}

#[tokio::test]
async fn toggle_flips_enabled_flag() {
    let f = fixture();
    let id = f
        .store
        .add(TrackedItem::new("a", "SKU1", "Z1", ""))
        .await
        .unwrap();

    let response = f
        .router
        .clone()
        .oneshot(empty_request("POST", &format!("/api/items/{id}/toggle")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["enabled"], false);

    let response = f
        .router
        .oneshot(empty_request("POST", &format!("/api/items/{id}/toggle")))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["enabled"], true);
}

#[tokio::test]
async fn toggle_unknown_id_is_not_found() {
    let f = fixture();
    let response = f
        .router
        .oneshot(empty_request(
            "POST",
            &format!("/api/items/{}/toggle", Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_is_idempotent_from_the_callers_view() {
    let f = fixture();
    let id = f
        .store
        .add(TrackedItem::new("a", "SKU1", "Z1", ""))
        .await
        .unwrap();

    let response = f
        .router
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/items/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(f.store.is_empty().await);

    // Second delete reports not found and changes nothing
    let response = f
        .router
        .oneshot(empty_request("DELETE", &format!("/api/items/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(f.store.is_empty().await);
}
