use crate::error::{BrainError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Sentinel operators leave in `engine_id` until a real deployment exists.
pub const PLACEHOLDER: &str = "TODO";

/// Lifecycle labels the tooling knows about. Others are kept as-is.
pub const KNOWN_STATUSES: &[&str] = &["not_deployed", "deployed", "deprecated"];

/// Selector value meaning "every agent in the document".
pub const ALL_AGENTS: &str = "all";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EnvironmentEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    #[serde(
        default,
        deserialize_with = "de_opt_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub engine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        alias = "project_id",
        deserialize_with = "de_opt_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl EnvironmentEntry {
    /// True when no real engine id has been recorded yet.
    ///
    /// Matches the sentinel anywhere in the value, so annotated forms such as
    /// `TODO-after-first-deploy` still count.
    pub fn is_placeholder(&self) -> bool {
        match self.engine_id.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(id) => id.contains(PLACEHOLDER),
        }
    }

    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }
}

// ---------------------------------------------------------------------------
// AgentEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentEntry {
    #[serde(default, alias = "display_name", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source directory of the agent. Informational only.
    #[serde(default, alias = "agent_dir", skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentEntry>,
}

impl AgentEntry {
    /// Look up an environment, treating `stage` and `staging` as one tier.
    pub fn environment(&self, env: &str) -> Option<&EnvironmentEntry> {
        self.environments
            .get(env)
            .or_else(|| env_alias(env).and_then(|alias| self.environments.get(alias)))
    }

    /// Environments in promotion order: dev, stage, prod, then the rest by name.
    pub fn ordered_environments(&self) -> Vec<(&str, &EnvironmentEntry)> {
        let mut envs: Vec<(&str, &EnvironmentEntry)> = self
            .environments
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        envs.sort_by(|a, b| env_rank(a.0).cmp(&env_rank(b.0)).then(a.0.cmp(b.0)));
        envs
    }
}

fn env_alias(env: &str) -> Option<&'static str> {
    match env {
        "stage" => Some("staging"),
        "staging" => Some("stage"),
        _ => None,
    }
}

fn env_rank(env: &str) -> u8 {
    match env {
        "dev" => 0,
        "stage" | "staging" => 1,
        "prod" => 2,
        _ => 3,
    }
}

// ---------------------------------------------------------------------------
// PromotionRule
// ---------------------------------------------------------------------------

/// Human-facing requirements for moving from one tier to the next, keyed in
/// the document as `<from>_to_<to>`. Shown to operators, never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionRule {
    #[serde(default)]
    pub required_checks: Vec<String>,
    #[serde(default)]
    pub manual_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_channel: Option<String>,
}

// ---------------------------------------------------------------------------
// EnvsConfig (top-level)
// ---------------------------------------------------------------------------

/// The `agent_engine_envs.yaml` document.
///
/// Read-only: operators edit the file by hand after each real deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvsConfig {
    #[serde(default, deserialize_with = "de_opt_scalar")]
    pub schema_version: Option<String>,
    #[serde(default, deserialize_with = "de_opt_scalar")]
    pub app_version: Option<String>,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub promotion: BTreeMap<String, PromotionRule>,
}

impl EnvsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BrainError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: EnvsConfig = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    pub fn schema_version_label(&self) -> &str {
        self.schema_version.as_deref().unwrap_or("unknown")
    }

    pub fn app_version_label(&self) -> &str {
        self.app_version.as_deref().unwrap_or("unknown")
    }

    /// Agents matching `selector` (`"all"` or a single name), in name order.
    /// An unknown name yields an empty list.
    pub fn select(&self, selector: &str) -> Vec<(&str, &AgentEntry)> {
        if selector == ALL_AGENTS {
            return self
                .agents
                .iter()
                .map(|(k, v)| (k.as_str(), v))
                .collect();
        }
        self.agents
            .get_key_value(selector)
            .map(|(k, v)| vec![(k.as_str(), v)])
            .unwrap_or_default()
    }

    pub fn promotion_rule(&self, from_env: &str, to_env: &str) -> Option<&PromotionRule> {
        let froms = [Some(from_env), env_alias(from_env)];
        let tos = [Some(to_env), env_alias(to_env)];
        froms
            .iter()
            .flatten()
            .flat_map(|f| tos.iter().flatten().map(move |t| format!("{f}_to_{t}")))
            .find_map(|key| self.promotion.get(&key))
    }

    // -----------------------------------------------------------------------
    // Lint
    // -----------------------------------------------------------------------

    /// Non-fatal observations about the document. None of these affect
    /// promotion readiness.
    pub fn lint(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (field, value) in [
            ("schema_version", &self.schema_version),
            ("app_version", &self.app_version),
        ] {
            match value {
                None => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{field} is not set"),
                }),
                Some(v) if !is_semver(v) => warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{field} '{v}' is not a semantic version"),
                }),
                Some(_) => {}
            }
        }

        for (name, agent) in &self.agents {
            if agent.environments.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("agent '{name}' has no environments"),
                });
            }
            for (env, entry) in agent.ordered_environments() {
                if let Some(status) = entry.status.as_deref() {
                    if !KNOWN_STATUSES.contains(&status) {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "agent '{name}' env '{env}' has unknown status '{status}'"
                            ),
                        });
                    }
                    if status == "deployed" && entry.is_placeholder() {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Error,
                            message: format!(
                                "agent '{name}' env '{env}' is marked deployed but has no engine id"
                            ),
                        });
                    }
                }
            }
        }

        warnings
    }
}

fn is_semver(v: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"^v?(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$",
        )
        .expect("valid regex")
    });
    re.is_match(v)
}

// ---------------------------------------------------------------------------
// Scalar coercion
// ---------------------------------------------------------------------------

/// Engine and project ids are often bare numbers in hand-edited YAML; accept
/// any scalar and keep its textual form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

fn de_opt_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| match s {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::UInt(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
