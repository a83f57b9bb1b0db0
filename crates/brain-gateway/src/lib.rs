//! Slack webhook gateway that forwards mentions to an Agent Engine backend
//! under a bounded timeout and retry policy.

pub mod backend;
pub mod config;
pub mod error;
pub mod resilience;
pub mod routes;
pub mod slack;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health::service_info))
        .route("/health", get(routes::health::health))
        .route("/slack/events", post(routes::events::slack_events))
        .route("/events", post(routes::events::slack_events))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the gateway on `0.0.0.0:<config.port>`.
pub async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(listener, AppState::new(config)?).await
}

/// Start the gateway on a pre-bound listener.
///
/// Lets the caller bind port 0 and read the actual port before starting.
pub async fn serve_on(listener: tokio::net::TcpListener, app_state: AppState) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let config = &app_state.config;

    tracing::info!(
        port = actual_port,
        routing = ?config.routing(),
        backend_available = app_state.backend_available(),
        slack_bot_enabled = config.slack_enabled,
        timeout_seconds = config.resilience.timeout_seconds,
        retry_enabled = config.resilience.retry_enabled,
        max_retries = config.resilience.max_retries,
        "slack webhook listening"
    );
    if !config.is_valid() {
        tracing::warn!(missing_vars = ?config.missing_vars(), "configuration incomplete");
    }

    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}
