use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid value '{value}' for {var}: expected {expected}")]
    InvalidEnv {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("slack api error: {0}")]
    Slack(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
