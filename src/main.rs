use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use voltria_backend::{
    config::{get_config, init_config},
    routes, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let snapshot = voltria_backend::storage::snapshot::FileSnapshot::new(&config.activities_path);
    info!("Activities snapshot at {}", snapshot.path().display());
    let app_state = AppState::new(Arc::new(snapshot)).await;

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let open_api = Router::new().route("/api/auth/login", post(routes::auth::login));

    // Guest-reachable surface; a bearer token refines what it shows.
    let identity_api = Router::new()
        .route("/api/analysis", post(routes::analysis::analyze_cv))
        .route("/api/activities", get(routes::activities::list_activities))
        .route(
            "/api/activities/:id",
            delete(routes::activities::remove_activity),
        )
        .route(
            "/api/activities/:id/contact",
            post(routes::activities::leave_contact),
        )
        .route(
            "/api/activities/:id/letter",
            get(routes::activities::rejection_letter),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::attach_identity,
        ));

    let candidate_api = Router::new()
        .route(
            "/api/applications",
            post(routes::activities::submit_application),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::require_candidate,
        ));

    let hr_api = Router::new()
        .route(
            "/api/activities/:id/status",
            post(routes::activities::override_status),
        )
        .route_layer(axum::middleware::from_fn(
            voltria_backend::middleware::auth::require_hr,
        ));

    let api = open_api
        .merge(identity_api)
        .merge(candidate_api)
        .merge(hr_api)
        .layer(axum::middleware::from_fn_with_state(
            voltria_backend::middleware::rate_limit::RequestBudget::new(config.public_rps),
            voltria_backend::middleware::rate_limit::throttle,
        ));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
