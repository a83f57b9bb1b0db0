use serde::Serialize;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ResilienceConfig
// ---------------------------------------------------------------------------

/// Per-process backend call policy, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResilienceConfig {
    pub timeout_seconds: u64,
    pub retry_enabled: bool,
    /// Additional attempts after the first. `0` means one attempt total,
    /// `1` means up to two.
    pub max_retries: u32,
}

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_RETRY_ENABLED: bool = true;
pub const DEFAULT_MAX_RETRIES: u32 = 1;

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_enabled: DEFAULT_RETRY_ENABLED,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ResilienceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Retries actually permitted once the enable flag is applied.
    pub fn effective_retries(&self) -> u32 {
        if self.retry_enabled {
            self.max_retries
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    HttpStatus,
    Timeout,
    Connection,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Text shown to the Slack user. Carries no internal detail.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::HttpStatus => "Sorry, I encountered an error processing your request.",
            ErrorKind::Timeout => "Sorry, my request timed out. Please try again.",
            ErrorKind::Connection => "Sorry, I'm having trouble connecting to my backend.",
            ErrorKind::Unknown => "Sorry, something went wrong.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BackendFailure
// ---------------------------------------------------------------------------

/// One failed backend attempt. `detail` is for operator logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct BackendFailure {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub detail: String,
}

const MAX_DETAIL_LEN: usize = 500;

impl BackendFailure {
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            status: Some(status),
            detail: truncate(body, MAX_DETAIL_LEN),
        }
    }

    /// The backend answered 2xx but reported an error in its body. Treated
    /// as an HTTP-level failure with no status, so it is never retried.
    pub fn reported(detail: &str) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            status: None,
            detail: truncate(detail, MAX_DETAIL_LEN),
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            status: None,
            detail: format!("no response within {seconds}s"),
        }
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Connection,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            detail: detail.into(),
        }
    }

    /// Map a transport error onto the closed category set.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self {
                kind: ErrorKind::Timeout,
                status: None,
                detail: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            Self::connection(err.to_string())
        } else {
            Self::unknown(err.to_string())
        }
    }

    /// Only server-side (5xx) statuses are worth a second attempt. Timeouts
    /// and connection failures are terminal.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::HttpStatus && is_retryable_status(self.status)
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }
}

fn is_retryable_status(status: Option<u16>) -> bool {
    matches!(status, Some(500..=599))
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
