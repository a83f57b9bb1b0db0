use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::slack::SlackClient;

/// Shared application state passed to all route handlers.
///
/// Built once at startup and never mutated; clones share the same clients.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    /// `None` when no routing target is configured.
    pub backend: Option<Arc<BackendClient>>,
    /// `None` unless the bot is enabled and has a token.
    pub slack: Option<Arc<SlackClient>>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let backend = match &config.route {
            Some(route) => Some(Arc::new(BackendClient::new(
                route.clone(),
                config.resilience.clone(),
                config.deployment_env.clone(),
            )?)),
            None => None,
        };

        let slack = match (&config.bot_token, config.slack_enabled) {
            (Some(token), true) => Some(Arc::new(SlackClient::new(
                config.slack_api_base.clone(),
                token.clone(),
            )?)),
            _ => None,
        };

        Ok(Self {
            config: Arc::new(config),
            backend,
            slack,
        })
    }

    pub fn backend_available(&self) -> bool {
        self.backend.is_some()
    }
}
