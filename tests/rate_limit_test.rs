use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::ServiceExt;

use voltria_backend::middleware::rate_limit::{throttle, RequestBudget};

#[tokio::test]
async fn budget_exhaustion_answers_429_within_the_window() {
    let app = Router::new()
        .route("/health", get(voltria_backend::routes::health::health))
        .layer(axum::middleware::from_fn_with_state(
            RequestBudget::new(2),
            throttle,
        ));

    for _ in 0..2 {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
