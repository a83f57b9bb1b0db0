use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("environment '{env}' is not ready for promotion: {} agent(s) still hold placeholder engine ids ({})", agents.len(), agents.join(", "))]
    OutstandingPlaceholders { env: String, agents: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl BrainError {
    /// Process exit code the CLI should use for this error.
    ///
    /// `2` is reserved for "placeholders remain" so CI can tell an unready
    /// environment apart from a broken config file (`1`).
    pub fn exit_code(&self) -> i32 {
        match self {
            BrainError::OutstandingPlaceholders { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outstanding_placeholders_exit_code_is_two() {
        let err = BrainError::OutstandingPlaceholders {
            env: "prod".into(),
            agents: vec!["bob".into(), "foreman".into()],
        };
        assert_eq!(err.exit_code(), 2);
        let msg = err.to_string();
        assert!(msg.contains("2 agent(s)"));
        assert!(msg.contains("bob, foreman"));
    }

    #[test]
    fn other_errors_exit_code_is_one() {
        assert_eq!(BrainError::ConfigNotFound("x.yaml".into()).exit_code(), 1);
        let io = std::io::Error::other("denied");
        assert_eq!(BrainError::Io(io).exit_code(), 1);
    }
}
