//! Tests for the HTTP layer: status codes and payloads per outcome.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use muninn::cache::{BucketParams, FileCache};
use muninn::server;
use muninn::store::{FileRow, MemoryStore};
use muninn::types::FileId;
use tower::ServiceExt;

fn params(per_minute: u32, burst: u32) -> BucketParams {
    BucketParams {
        reqs_per_minute: per_minute,
        burst_capacity: burst,
    }
}

fn app(store: Arc<MemoryStore>, known: BucketParams, unseen: BucketParams) -> Router {
    let cache = FileCache::new(store, known, unseen, Duration::from_secs(5));
    server::router(Arc::new(cache))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn known_row_returns_200_with_json_payload() {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        FileId::new("downloads", "stable"),
        FileRow {
            object_key: "builds/42/app.zip".to_string(),
            pattern: r"builds/(\d+)/".to_string(),
        },
    );
    let app = app(store, params(600, 100), params(600, 100));

    let response = app
        .oneshot(get("/v1/latestfiles/downloads/stable"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["bucket"], "downloads");
    assert_eq!(body["channel"], "stable");
    assert_eq!(body["key"], "builds/42/app.zip");
    assert_eq!(body["url"], "https://downloads/builds/42/app.zip");
    assert_eq!(body["buildnum"], "42");
}

#[tokio::test]
async fn missing_row_returns_404_with_empty_body() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store, params(600, 100), params(600, 100));

    let response = app
        .oneshot(get("/v1/latestfiles/downloads/stable"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn rate_limited_unknown_returns_429_with_empty_body() {
    let store = Arc::new(MemoryStore::new());
    // Zero-capacity unseen bucket: every unknown lookup is denied.
    let app = app(store, params(600, 100), params(60, 0));

    let response = app
        .oneshot(get("/v1/latestfiles/guessed/guessed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn store_failure_returns_500_with_empty_body() {
    let store = Arc::new(MemoryStore::new());
    store.set_failing(true);
    let app = app(store, params(600, 100), params(600, 100));

    let response = app
        .oneshot(get("/v1/latestfiles/downloads/stable"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn throttled_known_identifier_returns_200_from_cache() {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        FileId::new("downloads", "stable"),
        FileRow {
            object_key: "builds/42/app.zip".to_string(),
            pattern: r"builds/(\d+)/".to_string(),
        },
    );
    // Known buckets start with burst/2 = 1 token.
    let app = app(store.clone(), params(2, 2), params(600, 100));

    // First request creates the entry, second spends its token, third is
    // throttled and must come back 200 from cache, not 429.
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get("/v1/latestfiles/downloads/stable"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["buildnum"], "42");
    }
    assert_eq!(store.fetch_count(), 2);
}
