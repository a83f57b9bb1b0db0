use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::resilience::ErrorKind;
use crate::slack::{self, Envelope, SlackEvent};
use crate::state::AppState;

/// Largest webhook body read before the request is acknowledged unprocessed.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// POST /slack/events: Slack Events API webhook.
///
/// Always answers 200 so Slack never re-delivers; failures surface as log
/// lines and, for dispatched events, as an apology in `text`.
pub async fn slack_events(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Json<Value> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("slack_event", correlation_id = %correlation_id);
    async {
        let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "unreadable Slack payload"
                );
                return ack();
            }
        };
        handle(app, headers, body, &correlation_id).await
    }
    .instrument(span)
    .await
}

async fn handle(
    app: AppState,
    headers: HeaderMap,
    body: Bytes,
    correlation_id: &str,
) -> Json<Value> {
    if !signature_ok(&app, &headers, &body) {
        tracing::warn!(correlation_id, "rejected request with invalid Slack signature");
        return ack();
    }

    let envelope: Envelope = match serde_json::from_slice(&body) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(correlation_id, error = %e, "malformed Slack payload");
            return ack();
        }
    };

    let event = match envelope {
        Envelope::UrlVerification { challenge } => {
            tracing::info!(correlation_id, "url verification");
            return Json(json!({ "challenge": challenge }));
        }
        Envelope::EventCallback { event } => event,
        Envelope::Unsupported => {
            tracing::warn!(correlation_id, "unsupported envelope type");
            return ack();
        }
    };

    if let Some(retry) = headers.get(slack::RETRY_NUM_HEADER) {
        tracing::info!(
            correlation_id,
            retry_num = retry.to_str().unwrap_or("?"),
            "ignoring Slack re-delivery"
        );
        return ack();
    }

    if event.is_from_bot() {
        tracing::debug!(correlation_id, "ignoring bot message");
        return ack();
    }

    if !matches!(event.kind.as_str(), "app_mention" | "message") {
        tracing::info!(correlation_id, event_type = %event.kind, "ignoring event type");
        return ack();
    }

    let text = slack::strip_mention(
        event.text.as_deref().unwrap_or_default(),
        app.config.bot_user_id.as_deref(),
    );
    if text.is_empty() {
        tracing::debug!(correlation_id, "empty message after mention strip");
        return ack();
    }

    let reply = answer(&app, &event, &text, correlation_id).await;
    deliver(&app, &event, &reply, correlation_id).await;

    Json(json!({ "ok": true, "text": reply }))
}

async fn answer(app: &AppState, event: &SlackEvent, text: &str, correlation_id: &str) -> String {
    let Some(backend) = app.backend.as_ref() else {
        tracing::error!(
            correlation_id,
            error_type = ErrorKind::Connection.as_str(),
            "no backend configured"
        );
        return ErrorKind::Connection.user_message().to_string();
    };
    backend
        .dispatch(text, &event.session_id(), correlation_id)
        .await
        .reply()
}

async fn deliver(app: &AppState, event: &SlackEvent, reply: &str, correlation_id: &str) {
    let (Some(client), Some(channel)) = (app.slack.as_ref(), event.channel.as_deref()) else {
        return;
    };
    if let Err(e) = client.post_message(channel, reply, event.reply_thread()).await {
        tracing::error!(correlation_id, channel, error = %e, "failed to post Slack reply");
    }
}

/// Headers absent or no secret configured means there is nothing to check.
fn signature_ok(app: &AppState, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(secret) = app.config.signing_secret.as_deref() else {
        return true;
    };
    match (
        header_str(headers, slack::TIMESTAMP_HEADER),
        header_str(headers, slack::SIGNATURE_HEADER),
    ) {
        (Some(ts), Some(sig)) => {
            slack::verify(secret, ts, sig, body, chrono::Utc::now().timestamp())
        }
        _ => true,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn ack() -> Json<Value> {
    Json(json!({ "ok": true }))
}
