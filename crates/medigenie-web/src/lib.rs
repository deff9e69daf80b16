//! MediGenie Web Server
//!
//! Axum-based single-page interface and JSON API over the submission flow.

pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use medigenie_core::{GeminiClient, Settings};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/analyze", post(routes::api::analyze))
        .route(
            "/session",
            get(routes::api::get_session).delete(routes::api::delete_session),
        )
        .layer(cors)
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::page::index))
        .route("/analyze", post(routes::page::analyze))
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server against the configured Gemini model.
pub async fn run_server(settings: &Settings, client: GeminiClient, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(
        Arc::new(client),
        &settings.model,
        settings.session_ttl,
        settings.max_upload_bytes,
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
