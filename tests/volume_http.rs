//! Volume HTTP Tests
//!
//! Drives the full volume router (middleware included) in-process:
//! - Object write, read, delete status codes and bodies
//! - Listing JSON shape and query validation
//! - Namespace management and backup
//! - Error body shape and rate limiting

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use rawstore::http_server::{HttpServer, HttpServerConfig};
use rawstore::observability::MetricsRegistry;
use rawstore::service::{ServiceConfig, StorageService};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

fn volume_app(dir: &TempDir, config: HttpServerConfig) -> Router {
    let service = StorageService::open(
        &ServiceConfig::new(dir.path()),
        None,
        Arc::new(MetricsRegistry::new()),
    )
    .expect("Failed to open service");
    HttpServer::volume(config, service).router()
}

fn default_app(dir: &TempDir) -> Router {
    volume_app(dir, HttpServerConfig::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// =============================================================================
// Objects
// =============================================================================

#[tokio::test]
async fn test_put_then_get() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "PUT", "/default/a", "hello").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({"namespace": "default", "key": "a"})
    );

    let response = send(&app, "GET", "/default/a", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, b"hello");
}

#[tokio::test]
async fn test_post_conflict() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "POST", "/default/k", "first").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "POST", "/default/k", "second").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], 409);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let response = send(&app, "GET", "/default/k", Body::empty()).await;
    assert_eq!(body_bytes(response).await, b"first");
}

#[tokio::test]
async fn test_get_missing_key() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "GET", "/default/nothing", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 404);
}

#[tokio::test]
async fn test_unknown_namespace() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "PUT", "/missing/a", "x").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_always_ok() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    send(&app, "PUT", "/default/a", "x").await;
    for _ in 0..2 {
        let response = send(&app, "DELETE", "/default/a", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"msg": "ok"}));
    }
}

#[tokio::test]
async fn test_delete_in_unknown_namespace_ok() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "DELETE", "/nosuchns/k", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"msg": "ok"}));

    let response = send(&app, "GET", "/v1/namespace", Body::empty()).await;
    assert_eq!(body_json(response).await, json!(["default"]));
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_list_shape_and_paging() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    for i in 0..5 {
        send(&app, "PUT", &format!("/default/k{}", i), vec![0xffu8, i]).await;
    }

    let response = send(&app, "GET", "/default?page=1&limit=2", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["next"], 2);
    assert_eq!(body["rows"][0]["dataID"], "k0");
    assert_eq!(body["rows"][0]["data"], "/wA=");
    assert!(body["rows"][0]["createdAt"].is_string());

    let body = body_json(send(&app, "GET", "/v1/data/default?page=3&limit=2", Body::empty()).await).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], -1);
}

#[tokio::test]
async fn test_list_largest_page_is_empty() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);
    send(&app, "PUT", "/default/a", "x").await;

    let uri = format!("/default?page={0}&limit={0}", u32::MAX);
    let response = send(&app, "GET", &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"], json!([]));
    assert_eq!(body["next"], -1);
}

#[tokio::test]
async fn test_key_listing() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    send(&app, "PUT", "/default/a", "1").await;
    send(&app, "PUT", "/default/b", "2").await;

    let body = body_json(send(&app, "GET", "/v1/data/default/_list", Body::empty()).await).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["rows"][0]["dataID"], "b");
    assert!(body["rows"][0].get("data").is_none());
}

#[tokio::test]
async fn test_bad_pagination() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    for uri in ["/default?page=abc", "/default?limit=0", "/v1/data/default/_list?page=-1"] {
        let response = send(&app, "GET", uri, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {}", uri);
        assert_eq!(body_json(response).await["code"], 400);
    }
}

// =============================================================================
// Namespaces & Backup
// =============================================================================

#[tokio::test]
async fn test_create_namespace() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let request = json!({"name": "logs"}).to_string();
    let response = send(&app, "POST", "/v1/namespace", request.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!(["default", "logs"]));

    let response = send(&app, "POST", "/v1/namespace", request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(send(&app, "GET", "/v1/namespace", Body::empty()).await).await;
    assert_eq!(body, json!(["default", "logs"]));

    let response = send(&app, "PUT", "/logs/a", "x").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_namespace_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);

    let response = send(&app, "POST", "/v1/namespace", "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/v1/namespace", json!({"name": "a.b"}).to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backup() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);
    send(&app, "PUT", "/default/a", "x").await;

    let response = send(&app, "GET", "/v1/namespace/default/_backup", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["namespace"], "default");
    assert!(dir.path().join("default.backup.db").exists());

    // Backups are not namespaces.
    let body = body_json(send(&app, "GET", "/v1/namespace", Body::empty()).await).await;
    assert_eq!(body, json!(["default"]));
}

// =============================================================================
// Status & Middleware
// =============================================================================

#[tokio::test]
async fn test_status() {
    let dir = TempDir::new().unwrap();
    let app = default_app(&dir);
    send(&app, "PUT", "/default/a", "x").await;

    let response = send(&app, "GET", "/status", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["stream"], false);
    assert_eq!(body["namespaces"], json!(["default"]));
    assert_eq!(body["metrics"]["writes"], 1);
}

#[tokio::test]
async fn test_rate_limit() {
    let dir = TempDir::new().unwrap();
    let config = HttpServerConfig {
        rate_limit: 2,
        ..Default::default()
    };
    let app = volume_app(&dir, config);

    assert_eq!(send(&app, "GET", "/status", Body::empty()).await.status(), StatusCode::OK);
    assert_eq!(send(&app, "GET", "/status", Body::empty()).await.status(), StatusCode::OK);

    let response = send(&app, "GET", "/status", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["code"], 429);
}

#[tokio::test]
async fn test_body_limit() {
    let dir = TempDir::new().unwrap();
    let config = HttpServerConfig {
        max_body_bytes: 16,
        ..Default::default()
    };
    let app = volume_app(&dir, config);

    let response = send(&app, "PUT", "/default/big", vec![0u8; 1024]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
