use crate::error::{GatewayError, Result};
use crate::resilience::{
    ResilienceConfig, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_ENABLED, DEFAULT_TIMEOUT_SECONDS,
};
use serde::Serialize;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_DEPLOYMENT_ENV: &str = "dev";

// ---------------------------------------------------------------------------
// BackendRoute
// ---------------------------------------------------------------------------

/// Where inference requests go. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRoute {
    /// Preferred: through the A2A gateway's `/a2a/run`.
    A2aGateway { base_url: String },
    /// Fallback: straight at the Agent Engine `:query` REST endpoint.
    DirectEngine { url: String },
}

impl BackendRoute {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendRoute::A2aGateway { .. } => "a2a_gateway",
            BackendRoute::DirectEngine { .. } => "direct_agent_engine",
        }
    }
}

/// Routing state reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    Disabled,
    A2aGateway,
    DirectAgentEngine,
    Misconfigured,
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub slack_enabled: bool,
    pub bot_token: Option<String>,
    pub signing_secret: Option<String>,
    /// Bot's own Slack user id, stripped from mentions before dispatch.
    pub bot_user_id: Option<String>,
    pub slack_api_base: String,
    pub route: Option<BackendRoute>,
    pub deployment_env: String,
    pub port: u16,
    pub resilience: ResilienceConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            slack_enabled: false,
            bot_token: None,
            signing_secret: None,
            bot_user_id: None,
            slack_api_base: DEFAULT_SLACK_API_BASE.to_string(),
            route: None,
            deployment_env: DEFAULT_DEPLOYMENT_ENV.to_string(),
            port: DEFAULT_PORT,
            resilience: ResilienceConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        // New names win; the AGENT_ENGINE_* spellings are still honoured.
        let get_either = |primary: &'static str, legacy: &'static str| {
            get(primary)
                .map(|v| (primary, v))
                .or_else(|| get(legacy).map(|v| (legacy, v)))
        };

        let resilience = ResilienceConfig {
            timeout_seconds: match get_either("BACKEND_TIMEOUT_SECONDS", "AGENT_ENGINE_TIMEOUT_SECONDS")
            {
                Some((var, v)) => parse_number(var, &v)?,
                None => DEFAULT_TIMEOUT_SECONDS,
            },
            retry_enabled: match get_either("BACKEND_RETRY_ENABLED", "AGENT_ENGINE_RETRY_ENABLED") {
                Some((var, v)) => parse_bool(var, &v)?,
                None => DEFAULT_RETRY_ENABLED,
            },
            max_retries: match get_either("BACKEND_MAX_RETRIES", "AGENT_ENGINE_MAX_RETRIES") {
                Some((var, v)) => parse_number(var, &v)?,
                None => DEFAULT_MAX_RETRIES,
            },
        };

        let slack_enabled = match get("SLACK_BOB_ENABLED") {
            Some(v) => parse_bool("SLACK_BOB_ENABLED", &v)?,
            None => false,
        };

        let port = match get("PORT") {
            Some(v) => parse_number("PORT", &v)?,
            None => DEFAULT_PORT,
        };

        let route = if let Some(base_url) = get("A2A_GATEWAY_URL") {
            Some(BackendRoute::A2aGateway {
                base_url: base_url.trim_end_matches('/').to_string(),
            })
        } else {
            match (get("PROJECT_ID"), get("LOCATION"), get("AGENT_ENGINE_ID")) {
                (Some(project), Some(location), Some(engine)) => {
                    let url = get("AGENT_ENGINE_URL").unwrap_or_else(|| {
                        format!(
                            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}\
                             /locations/{location}/reasoningEngines/{engine}:query"
                        )
                    });
                    Some(BackendRoute::DirectEngine { url })
                }
                _ => None,
            }
        };

        Ok(Self {
            slack_enabled,
            bot_token: get("SLACK_BOT_TOKEN"),
            signing_secret: get("SLACK_SIGNING_SECRET"),
            bot_user_id: get("SLACK_BOT_USER_ID"),
            slack_api_base: get("SLACK_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string()),
            route,
            deployment_env: get("DEPLOYMENT_ENV")
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT_ENV.to_string()),
            port,
            resilience,
        })
    }

    pub fn backend_available(&self) -> bool {
        self.route.is_some()
    }

    /// Variables the bot needs but does not have. Always empty when the bot
    /// is disabled.
    pub fn missing_vars(&self) -> Vec<String> {
        if !self.slack_enabled {
            return Vec::new();
        }
        let mut missing = Vec::new();
        if self.bot_token.is_none() {
            missing.push("SLACK_BOT_TOKEN".to_string());
        }
        if self.signing_secret.is_none() {
            missing.push("SLACK_SIGNING_SECRET".to_string());
        }
        if self.route.is_none() {
            missing.push("A2A_GATEWAY_URL or (PROJECT_ID + LOCATION + AGENT_ENGINE_ID)".to_string());
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_vars().is_empty()
    }

    pub fn routing(&self) -> Routing {
        if !self.slack_enabled {
            return Routing::Disabled;
        }
        match &self.route {
            Some(BackendRoute::A2aGateway { .. }) => Routing::A2aGateway,
            Some(BackendRoute::DirectEngine { .. }) => Routing::DirectAgentEngine,
            None => Routing::Misconfigured,
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| GatewayError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        expected: "a non-negative integer",
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            expected: "true or false",
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
