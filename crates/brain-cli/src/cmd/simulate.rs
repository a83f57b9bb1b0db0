use crate::output::print_json;
use anyhow::Context;
use brain_gateway::slack;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_TEXT: &str = "What is your current status and version?";

const FAKE_BOT_USER: &str = "U07NRCYJX8A";

/// Build a Slack `app_mention` event_callback envelope stamped at `now`.
fn build_payload(text: &str, now: i64) -> serde_json::Value {
    let event_ts = format!("{now}.000001");
    serde_json::json!({
        "token": "FAKE_VERIFICATION_TOKEN",
        "team_id": "T_FAKE_TEAM",
        "api_app_id": "A_FAKE_APP",
        "type": "event_callback",
        "event_id": format!("Ev_FAKE_{now}"),
        "event_time": now,
        "authed_users": [FAKE_BOT_USER],
        "event": {
            "type": "app_mention",
            "user": "U_FAKE_USER",
            "text": format!("<@{FAKE_BOT_USER}> {text}"),
            "ts": event_ts,
            "channel": "C_FAKE_CHANNEL",
            "event_ts": event_ts,
        },
    })
}

pub fn run(url: &str, text: &str, signing_secret: Option<&str>, json: bool) -> anyhow::Result<()> {
    let now = chrono::Utc::now().timestamp();
    let payload = build_payload(text, now);
    let body = serde_json::to_vec(&payload)?;
    let endpoint = format!("{}/slack/events", url.trim_end_matches('/'));

    let mut request = ureq::post(&endpoint).set("Content-Type", "application/json");
    match signing_secret {
        Some(secret) => {
            let ts = now.to_string();
            let signature = slack::sign(secret, &ts, &body);
            request = request
                .set(slack::TIMESTAMP_HEADER, &ts)
                .set(slack::SIGNATURE_HEADER, &signature);
        }
        None => tracing::warn!("no signing secret; sending unsigned request"),
    }

    tracing::info!(endpoint = %endpoint, "posting simulated app_mention");
    let (status, raw) = match request.send_bytes(&body) {
        Ok(resp) => (resp.status(), resp.into_string()?),
        Err(ureq::Error::Status(code, resp)) => (code, resp.into_string()?),
        Err(e) => return Err(e).with_context(|| format!("failed to reach {endpoint}")),
    };
    let response: serde_json::Value =
        serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));

    if json {
        print_json(&serde_json::json!({
            "status": status,
            "request": payload,
            "response": response,
        }))?;
    } else {
        println!("POST {endpoint} -> {status}");
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    if !(200..300).contains(&status) {
        anyhow::bail!("gateway answered with status {status}");
    }
    Ok(())
}
