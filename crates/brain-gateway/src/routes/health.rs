use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::config::Routing;
use crate::resilience::ResilienceConfig;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "slack-webhook";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub slack_bot_enabled: bool,
    pub config_valid: bool,
    pub missing_vars: Vec<String>,
    pub routing: Routing,
    pub backend_available: bool,
    pub resilience: ResilienceConfig,
}

/// GET /health: liveness plus the active configuration.
///
/// Read-only. Never includes URLs or secrets.
pub async fn health(State(app): State<AppState>) -> Json<HealthResponse> {
    let config = &app.config;
    let config_valid = config.is_valid();
    Json(HealthResponse {
        status: if config_valid { "healthy" } else { "degraded" },
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        slack_bot_enabled: config.slack_enabled,
        config_valid,
        missing_vars: config.missing_vars(),
        routing: config.routing(),
        backend_available: app.backend_available(),
        resilience: config.resilience.clone(),
    })
}

/// GET /: service metadata.
pub async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Bob's Brain Slack Webhook",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Slack event handler proxying to Vertex AI Agent Engine",
        "endpoints": {
            "events": "/slack/events",
            "health": "/health",
        },
    }))
}
