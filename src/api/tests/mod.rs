use super::*;
use crate::downloader::test_helpers::{ScriptedEngine, wait_for_terminal};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;

mod preview;

/// Helper to create a test MediaDownloader instance wrapped in Arc
async fn create_test_downloader(engine: ScriptedEngine) -> (Arc<MediaDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) =
        crate::downloader::test_helpers::create_test_downloader(engine).await;
    (Arc::new(downloader), temp_dir)
}

/// Router using the downloader's own configuration
fn test_router(downloader: &Arc<MediaDownloader>) -> Router {
    create_router(downloader.clone(), downloader.get_config())
}

/// Send one request and collect the full response
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_gracefully() {
    let (downloader, _temp_dir) =
        create_test_downloader(ScriptedEngine::producing("a.mp4", "a.mp4")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(serve_until(downloader, config, async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_exposes_content_disposition() {
    let (downloader, _temp_dir) =
        create_test_downloader(ScriptedEngine::producing("a.mp4", "a.mp4")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let exposed = headers
        .get("access-control-expose-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("content-disposition"));
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origin() {
    let (downloader, _temp_dir) =
        create_test_downloader(ScriptedEngine::producing("a.mp4", "a.mp4")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["http://frontend.local".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://frontend.local")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://frontend.local"
    );

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://elsewhere.local")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert!(headers.get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_swagger_ui_only_when_enabled() {
    let (downloader, _temp_dir) =
        create_test_downloader(ScriptedEngine::producing("a.mp4", "a.mp4")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(downloader.clone(), Arc::new(config.clone()));
    let (status, _, _) = send(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    config.server.api.swagger_ui = true;
    let app = create_router(downloader, Arc::new(config));
    let (status, _, _) = send(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
}
