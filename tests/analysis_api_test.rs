use std::env;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use voltria_backend::storage::snapshot::MemorySnapshot;

const BOUNDARY: &str = "voltria-test-boundary";

fn test_env() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("OPENAI_API_KEY", "sk-test");
    env::set_var("ACTIVITIES_PATH", "./data/test-activities.json");
    env::set_var("PUBLIC_RPS", "100");
    let _ = voltria_backend::config::init_config();
}

async fn test_app() -> Router {
    let app_state = voltria_backend::AppState::new(Arc::new(MemorySnapshot::new())).await;
    Router::new()
        .route(
            "/api/analysis",
            post(voltria_backend::routes::analysis::analyze_cv),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::attach_identity,
        ))
        .with_state(app_state)
}

fn cv_upload(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(
        format!(
            "\r\n--{}\r\nContent-Disposition: form-data; name=\"target_job\"\r\n\r\nBackend Developer\r\n--{}--\r\n",
            BOUNDARY, BOUNDARY
        )
        .as_bytes(),
    );
    body
}

async fn upload(app: &Router, body: Vec<u8>) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/analysis")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn upload_without_cv_field_is_rejected() {
    test_env();
    let app = test_app().await;

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"target_job\"\r\n\r\nBackend\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let (status, json) = upload(&app, body.into_bytes()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "CV file is required");
}

#[tokio::test]
async fn upload_with_disallowed_extension_is_rejected() {
    test_env();
    let app = test_app().await;

    let (status, json) = upload(&app, cv_upload("cv.txt", b"plain text resume")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not allowed"));
}

#[tokio::test]
async fn upload_magic_bytes_must_match_the_extension() {
    test_env();
    let app = test_app().await;

    let (status, json) = upload(&app, cv_upload("cv.pdf", b"GIF89a not a pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid PDF file content");

    let (status, json) = upload(&app, cv_upload("photo.png", &[0xFF, 0xD8, 0x01, 0x02])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid PNG file content");

    let (status, json) = upload(&app, cv_upload("photo.jpg", &[0x89, 0x50, 0x4E, 0x47])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid JPEG file content");
}
