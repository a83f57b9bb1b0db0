use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{GatewayError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Requests whose timestamp is further than this from now are rejected.
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 60 * 5;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
/// Set by Slack when it re-delivers an event it considers unacknowledged.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Slack sends `null` for some message subtypes.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl SlackEvent {
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some()
    }

    /// Replies go into the existing thread, or start one on the message.
    pub fn reply_thread(&self) -> Option<&str> {
        self.thread_ts.as_deref().or(self.ts.as_deref())
    }

    /// Backend session key: one conversation per user per channel.
    pub fn session_id(&self) -> String {
        format!(
            "{}_{}",
            self.user.as_deref().unwrap_or("unknown"),
            self.channel.as_deref().unwrap_or("unknown")
        )
    }
}

/// Remove the bot's own mention from `text`.
///
/// With a known bot id every `<@BOTID>` token is dropped; otherwise only a
/// leading `<@...>` token is.
pub fn strip_mention(text: &str, bot_user_id: Option<&str>) -> String {
    match bot_user_id {
        Some(id) => text.replace(&format!("<@{id}>"), "").trim().to_string(),
        None => {
            let trimmed = text.trim_start();
            if trimmed.starts_with("<@") {
                if let Some(end) = trimmed.find('>') {
                    return trimmed[end + 1..].trim().to_string();
                }
            }
            text.trim().to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Request signing
// ---------------------------------------------------------------------------

/// Compute Slack's `v0=` signature over `v0:<timestamp>:<body>`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = mac_for(secret, timestamp, body).finalize().into_bytes();
    format!("v0={}", hex::encode(digest))
}

/// Constant-time check of a Slack request signature against `now` (unix
/// seconds).
pub fn verify(secret: &str, timestamp: &str, signature: &str, body: &[u8], now: i64) -> bool {
    let Ok(ts) = timestamp.trim().parse::<i64>() else {
        return false;
    };
    if (now - ts).abs() > MAX_TIMESTAMP_SKEW_SECS {
        return false;
    }
    let Some(hex_sig) = signature.strip_prefix("v0=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    mac_for(secret, timestamp, body)
        .verify_slice(&expected)
        .is_ok()
}

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac
}

// ---------------------------------------------------------------------------
// SlackClient
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Minimal Web API client for posting replies.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()> {
        let resp: SlackApiResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&PostMessage {
                channel,
                text,
                thread_ts,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !resp.ok {
            return Err(GatewayError::Slack(
                resp.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
