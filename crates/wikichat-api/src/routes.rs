//! Router setup with all routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, rate
//! limiting on submissions, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use wikichat_core::config::ServerConfig;
use wikichat_core::error::WikichatError;

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let origins: Vec<HeaderValue> = [
        format!("http://{}:{}", server.host, server.port),
        format!("http://127.0.0.1:{}", server.port),
        format!("http://localhost:{}", server.port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let limiter = RateLimiter::new(server.rate_limit_per_sec);

    // Only question submission reaches the LLM, so only it is rate-limited.
    let submission_routes = Router::new()
        .route("/api/sessions/{id}/messages", post(handlers::post_message))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(limiter));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/page", get(handlers::page))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .merge(submission_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until the process ends.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), WikichatError> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WikichatError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Serving WikiChat on http://{}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| WikichatError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
