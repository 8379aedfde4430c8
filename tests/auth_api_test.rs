use std::env;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use voltria_backend::storage::snapshot::MemorySnapshot;

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
    let open_api =
        Router::new().route("/api/auth/login", post(voltria_backend::routes::auth::login));
    let candidate_api = Router::new()
        .route(
            "/api/applications",
            post(voltria_backend::routes::activities::submit_application),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::require_candidate,
        ));
    let hr_api = Router::new()
        .route(
            "/api/activities/:id/status",
            post(voltria_backend::routes::activities::override_status),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::require_hr,
        ));
    open_api
        .merge(candidate_api)
        .merge(hr_api)
        .with_state(app_state)
}

async fn post_login(app: &Router, body: JsonValue) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn demo_accounts_log_in_with_their_roles() {
    test_env();
    let app = test_app().await;

    let (status, body) = post_login(&app, json!({"username": "test", "password": "123"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ứng viên Test");
    assert_eq!(body["user"]["role"], "candidate");
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);

    let (status, body) = post_login(&app, json!({"username": "nhipham", "password": "1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "hr");

    let (status, body) =
        post_login(&app, json!({"username": "admin_voltria", "password": "123456"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "hr");
}

#[tokio::test]
async fn bad_credentials_are_rejected_uniformly() {
    test_env();
    let app = test_app().await;

    let (status, body) = post_login(&app, json!({"username": "test", "password": "wrong"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Tài khoản hoặc mật khẩu không chính xác");

    let (status, body) =
        post_login(&app, json!({"username": "nobody", "password": "123"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Tài khoản hoặc mật khẩu không chính xác");

    let (status, _body) = post_login(&app, json!({"username": "", "password": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn role_guards_reject_wrong_or_missing_tokens() {
    test_env();
    let app = test_app().await;

    let apply_body = json!({
        "job": {"title": "BA", "provider": "Fintech", "description": null},
        "cv": null
    })
    .to_string();

    // No token at all.
    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("content-type", "application/json")
        .body(Body::from(apply_body.clone()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "missing_authorization");

    // Wrong scheme.
    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("content-type", "application/json")
        .header("authorization", "Token abc")
        .body(Body::from(apply_body.clone()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "unsupported_scheme");

    // Garbage token.
    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("content-type", "application/json")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::from(apply_body.clone()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_token");

    // An HR session is not a candidate session and vice versa.
    let (_, hr_login) = post_login(&app, json!({"username": "nhipham", "password": "1"})).await;
    let hr_auth = format!("Bearer {}", hr_login["token"].as_str().unwrap());
    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("content-type", "application/json")
        .header("authorization", hr_auth)
        .body(Body::from(apply_body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (_, candidate_login) =
        post_login(&app, json!({"username": "test", "password": "123"})).await;
    let candidate_auth = format!("Bearer {}", candidate_login["token"].as_str().unwrap());
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/activities/{}/status", uuid::Uuid::new_v4()))
        .header("content-type", "application/json")
        .header("authorization", candidate_auth)
        .body(Body::from(json!({"status": "rejected"}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
