//! Inference backend client with the bounded retry policy.
//!
//! One [`BackendClient`] is built at startup and shared by every request
//! handler; it holds the pooled `reqwest::Client` and the resolved route.

use serde::{Deserialize, Serialize};

use crate::config::BackendRoute;
use crate::error::Result;
use crate::resilience::{BackendFailure, ResilienceConfig};

const A2A_AGENT_ROLE: &str = "bob";
const A2A_CALLER_SPIFFE_ID: &str = "spiffe://intent.solutions/slack/webhook";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct A2aAgentCall<'a> {
    agent_role: &'a str,
    prompt: &'a str,
    session_id: &'a str,
    caller_spiffe_id: &'a str,
    env: &'a str,
}

#[derive(Debug, Deserialize)]
struct A2aAgentResult {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct EngineQuery<'a> {
    query: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct EngineResult {
    #[serde(default)]
    response: Option<String>,
}

// ---------------------------------------------------------------------------
// DispatchOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of attempts made, 1-indexed.
    pub attempts: u32,
    pub result: std::result::Result<String, BackendFailure>,
}

impl DispatchOutcome {
    /// The text to hand back to the user: the answer, or a safe apology.
    pub fn reply(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(failure) => failure.user_message().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    route: BackendRoute,
    resilience: ResilienceConfig,
    deployment_env: String,
}

impl BackendClient {
    pub fn new(
        route: BackendRoute,
        resilience: ResilienceConfig,
        deployment_env: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            route,
            resilience,
            deployment_env: deployment_env.into(),
        })
    }

    pub fn route(&self) -> &BackendRoute {
        &self.route
    }

    pub fn resilience(&self) -> &ResilienceConfig {
        &self.resilience
    }

    /// Send `query` to the backend, retrying once-per-budget on 5xx only.
    ///
    /// There is no delay between attempts. Each attempt is bounded by the
    /// configured timeout; an elapsed attempt is dropped, not cancelled
    /// server-side.
    pub async fn dispatch(
        &self,
        query: &str,
        session_id: &str,
        correlation_id: &str,
    ) -> DispatchOutcome {
        let max_retries = self.resilience.effective_retries();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::info!(
                correlation_id,
                attempt,
                max_retries,
                route = self.route.kind(),
                query_length = query.len(),
                session_id,
                timeout_seconds = self.resilience.timeout_seconds,
                "dispatching to backend"
            );

            let result =
                match tokio::time::timeout(self.resilience.timeout(), self.attempt(query, session_id))
                    .await
                {
                    Ok(r) => r,
                    Err(_) => Err(BackendFailure::timeout(self.resilience.timeout_seconds)),
                };

            match result {
                Ok(text) => {
                    tracing::info!(
                        correlation_id,
                        attempt,
                        response_length = text.len(),
                        "backend response received"
                    );
                    return DispatchOutcome {
                        attempts: attempt,
                        result: Ok(text),
                    };
                }
                Err(failure) if failure.is_retryable() && attempt <= max_retries => {
                    tracing::warn!(
                        correlation_id,
                        attempt,
                        max_retries,
                        error_type = failure.kind.as_str(),
                        status = failure.status,
                        will_retry = true,
                        "backend attempt failed, retrying"
                    );
                }
                Err(failure) => {
                    tracing::error!(
                        correlation_id,
                        attempt,
                        error_type = failure.kind.as_str(),
                        status = failure.status,
                        detail = %failure.detail,
                        "backend call failed"
                    );
                    return DispatchOutcome {
                        attempts: attempt,
                        result: Err(failure),
                    };
                }
            }
        }
    }

    async fn attempt(
        &self,
        query: &str,
        session_id: &str,
    ) -> std::result::Result<String, BackendFailure> {
        let request = match &self.route {
            BackendRoute::A2aGateway { base_url } => self
                .http
                .post(format!("{base_url}/a2a/run"))
                .json(&A2aAgentCall {
                    agent_role: A2A_AGENT_ROLE,
                    prompt: query,
                    session_id,
                    caller_spiffe_id: A2A_CALLER_SPIFFE_ID,
                    env: &self.deployment_env,
                }),
            BackendRoute::DirectEngine { url } => {
                self.http.post(url).json(&EngineQuery { query, session_id })
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| BackendFailure::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendFailure::http_status(status.as_u16(), &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendFailure::from_reqwest(&e))?;

        match &self.route {
            BackendRoute::A2aGateway { .. } => {
                let result: A2aAgentResult = serde_json::from_slice(&bytes)
                    .map_err(|e| BackendFailure::unknown(format!("invalid A2A result: {e}")))?;
                if let Some(err) = result.error.as_ref().filter(|v| is_reported_error(v)) {
                    return Err(BackendFailure::reported(&format!(
                        "A2A gateway error: {err}"
                    )));
                }
                Ok(result
                    .response
                    .unwrap_or_else(|| "No response from A2A gateway".to_string()))
            }
            BackendRoute::DirectEngine { .. } => {
                let result: EngineResult = serde_json::from_slice(&bytes)
                    .map_err(|e| BackendFailure::unknown(format!("invalid engine result: {e}")))?;
                Ok(result
                    .response
                    .unwrap_or_else(|| "I couldn't generate a response.".to_string()))
            }
        }
    }
}

/// `null`, `false`, `""` and empty containers mean "no error".
fn is_reported_error(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
        serde_json::Value::Number(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::ErrorKind;

    #[test]
    fn a2a_call_serializes_expected_fields() {
        let call = A2aAgentCall {
            agent_role: A2A_AGENT_ROLE,
            prompt: "status?",
            session_id: "U1_C1",
            caller_spiffe_id: A2A_CALLER_SPIFFE_ID,
            env: "dev",
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["agent_role"], "bob");
        assert_eq!(json["prompt"], "status?");
        assert_eq!(json["session_id"], "U1_C1");
        assert_eq!(json["env"], "dev");
        assert!(json["caller_spiffe_id"].as_str().unwrap().starts_with("spiffe://"));
    }

    #[test]
    fn reported_error_detection() {
        assert!(!is_reported_error(&serde_json::Value::Null));
        assert!(!is_reported_error(&serde_json::json!("")));
        assert!(!is_reported_error(&serde_json::json!({})));
        assert!(is_reported_error(&serde_json::json!("agent crashed")));
        assert!(is_reported_error(&serde_json::json!({"code": 7})));
    }

    #[test]
    fn reply_uses_apology_on_failure() {
        let ok = DispatchOutcome {
            attempts: 1,
            result: Ok("hi".into()),
        };
        assert_eq!(ok.reply(), "hi");

        let failed = DispatchOutcome {
            attempts: 2,
            result: Err(BackendFailure::http_status(503, "overloaded")),
        };
        assert_eq!(failed.reply(), ErrorKind::HttpStatus.user_message());
    }

    #[tokio::test]
    async fn unreachable_backend_is_connection_failure_without_retry() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = BackendClient::new(
            BackendRoute::DirectEngine {
                url: format!("http://127.0.0.1:{port}/query"),
            },
            ResilienceConfig {
                timeout_seconds: 5,
                retry_enabled: true,
                max_retries: 1,
            },
            "dev",
        )
        .unwrap();
        let outcome = client.dispatch("hello", "U_C", "cid-1").await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result.unwrap_err().kind, ErrorKind::Connection);
    }
}
