//! Read-only views over [`EnvsConfig`] used by the `show` and `validate`
//! commands.
//!
//! Nothing here touches the network or the file on disk: readiness is judged
//! purely from what operators have committed to the document.

use crate::envs::{EnvironmentEntry, EnvsConfig, PromotionRule, ALL_AGENTS};
use crate::error::{BrainError, Result};
use serde::Serialize;

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentView {
    pub env: String,
    pub engine_id: Option<String>,
    pub status: String,
    pub project: Option<String>,
    pub region: Option<String>,
    pub placeholder: bool,
}

impl EnvironmentView {
    fn new(env: &str, entry: &EnvironmentEntry) -> Self {
        Self {
            env: env.to_string(),
            engine_id: entry.engine_id.clone(),
            status: entry.status_label().to_string(),
            project: entry.project.clone(),
            region: entry.region.clone(),
            placeholder: entry.is_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub name: String,
    pub description: Option<String>,
    pub directory: Option<String>,
    pub environments: Vec<EnvironmentView>,
}

/// Full per-environment mapping for every agent matching `selector`.
pub fn show(config: &EnvsConfig, selector: &str) -> Vec<AgentView> {
    config
        .select(selector)
        .into_iter()
        .map(|(name, agent)| AgentView {
            name: name.to_string(),
            description: agent.description.clone(),
            directory: agent.directory.clone(),
            environments: agent
                .ordered_environments()
                .into_iter()
                .map(|(env, entry)| EnvironmentView::new(env, entry))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// promotion path
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PromotionRow {
    pub agent: String,
    /// `None` when the agent has no entry for the source environment.
    pub from: Option<EnvironmentView>,
    pub to: Option<EnvironmentView>,
}

impl PromotionRow {
    pub fn from_placeholder(&self) -> bool {
        self.from.as_ref().map_or(true, |v| v.placeholder)
    }

    pub fn to_placeholder(&self) -> bool {
        self.to.as_ref().map_or(true, |v| v.placeholder)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromotionPath {
    pub from_env: String,
    pub to_env: String,
    pub rows: Vec<PromotionRow>,
    pub rule: Option<PromotionRule>,
    /// Placeholder slots across both sides of the path.
    pub placeholder_count: usize,
}

/// Side-by-side `from_env` / `to_env` mapping for every matching agent.
pub fn promotion_path(
    config: &EnvsConfig,
    from_env: &str,
    to_env: &str,
    selector: &str,
) -> PromotionPath {
    let rows: Vec<PromotionRow> = config
        .select(selector)
        .into_iter()
        .map(|(name, agent)| PromotionRow {
            agent: name.to_string(),
            from: agent
                .environment(from_env)
                .map(|e| EnvironmentView::new(from_env, e)),
            to: agent
                .environment(to_env)
                .map(|e| EnvironmentView::new(to_env, e)),
        })
        .collect();

    let placeholder_count = rows
        .iter()
        .map(|r| usize::from(r.from_placeholder()) + usize::from(r.to_placeholder()))
        .sum();

    PromotionPath {
        from_env: from_env.to_string(),
        to_env: to_env.to_string(),
        rule: config.promotion_rule(from_env, to_env).cloned(),
        rows,
        placeholder_count,
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub env: String,
    /// Agents that were examined, in name order.
    pub checked: Vec<String>,
    /// Agents whose entry for `env` is missing or still a placeholder.
    pub outstanding: Vec<String>,
}

impl ValidationReport {
    pub fn is_ready(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Convert an unready report into [`BrainError::OutstandingPlaceholders`].
    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        Err(BrainError::OutstandingPlaceholders {
            env: self.env.clone(),
            agents: self.outstanding.clone(),
        })
    }
}

/// Collect every agent that would block promotion into `target_env`.
///
/// A named agent that does not exist in the document is reported as
/// outstanding rather than silently skipped.
pub fn validate(config: &EnvsConfig, target_env: &str, selector: &str) -> ValidationReport {
    let selected = config.select(selector);

    let mut checked = Vec::new();
    let mut outstanding = Vec::new();

    if selected.is_empty() && selector != ALL_AGENTS {
        checked.push(selector.to_string());
        outstanding.push(selector.to_string());
    }

    for (name, agent) in selected {
        checked.push(name.to_string());
        let ready = agent
            .environment(target_env)
            .is_some_and(|e| !e.is_placeholder());
        if !ready {
            outstanding.push(name.to_string());
        }
    }

    ValidationReport {
        env: target_env.to_string(),
        checked,
        outstanding,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EnvsConfig {
        EnvsConfig::from_yaml(
            r##"
schema_version: "1.0.0"
app_version: "0.14.1"
agents:
  bob:
    description: orchestrator
    environments:
      dev: { engine_id: "111", status: deployed }
      stage: { engine_id: "222", status: deployed }
      prod: { engine_id: TODO, status: not_deployed }
  foreman:
    environments:
      dev: { engine_id: "333", status: deployed }
      staging: { engine_id: TODO, status: not_deployed }
      prod: { engine_id: TODO, status: not_deployed }
  iam-adk:
    environments:
      dev: { engine_id: "444", status: deployed }
promotion:
  stage_to_prod:
    required_checks: [arv_gate, smoke_tests]
    manual_approval: true
    approval_channel: "#deployments"
"##,
        )
        .unwrap()
    }

    #[test]
    fn show_all_returns_one_entry_per_agent() {
        let views = show(&config(), "all");
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "foreman", "iam-adk"]);
    }

    #[test]
    fn show_single_agent_lists_environments_in_order() {
        let views = show(&config(), "bob");
        assert_eq!(views.len(), 1);
        let envs: Vec<&str> = views[0].environments.iter().map(|e| e.env.as_str()).collect();
        assert_eq!(envs, vec!["dev", "stage", "prod"]);
        assert!(views[0].environments[2].placeholder);
        assert_eq!(views[0].environments[2].status, "not_deployed");
    }

    #[test]
    fn show_unknown_agent_is_empty() {
        assert!(show(&config(), "nobody").is_empty());
    }

    #[test]
    fn promotion_path_pairs_environments() {
        let path = promotion_path(&config(), "dev", "stage", "all");
        assert_eq!(path.rows.len(), 3);

        let bob = &path.rows[0];
        assert_eq!(bob.from.as_ref().unwrap().engine_id.as_deref(), Some("111"));
        assert_eq!(bob.to.as_ref().unwrap().engine_id.as_deref(), Some("222"));

        // foreman's `staging` key answers a `stage` query
        let foreman = &path.rows[1];
        assert!(foreman.to.as_ref().unwrap().placeholder);

        // iam-adk has no stage entry at all
        let iam = &path.rows[2];
        assert!(iam.to.is_none());
        assert!(iam.to_placeholder());

        assert_eq!(path.placeholder_count, 2);
        assert!(path.rule.is_none());
    }

    #[test]
    fn promotion_path_carries_rule() {
        let path = promotion_path(&config(), "stage", "prod", "bob");
        assert_eq!(path.rows.len(), 1);
        let rule = path.rule.unwrap();
        assert!(rule.manual_approval);
        assert_eq!(rule.required_checks, vec!["arv_gate", "smoke_tests"]);
    }

    #[test]
    fn validate_ready_environment_passes() {
        let report = validate(&config(), "dev", "all");
        assert!(report.is_ready());
        assert_eq!(report.checked.len(), 3);
        assert!(report.ensure_ready().is_ok());
    }

    #[test]
    fn validate_names_every_offending_agent() {
        let report = validate(&config(), "prod", "all");
        assert_eq!(report.outstanding, vec!["bob", "foreman", "iam-adk"]);
        let err = report.ensure_ready().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        match err {
            BrainError::OutstandingPlaceholders { env, agents } => {
                assert_eq!(env, "prod");
                assert_eq!(agents.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_missing_environment_counts_as_placeholder() {
        let report = validate(&config(), "staging", "all");
        assert_eq!(report.outstanding, vec!["foreman", "iam-adk"]);
    }

    #[test]
    fn validate_single_agent() {
        let report = validate(&config(), "stage", "bob");
        assert!(report.is_ready());
        assert_eq!(report.checked, vec!["bob"]);
    }

    #[test]
    fn validate_unknown_agent_is_outstanding() {
        let report = validate(&config(), "dev", "bbo");
        assert!(!report.is_ready());
        assert_eq!(report.outstanding, vec!["bbo"]);
    }

    #[test]
    fn views_serialize_to_json() {
        let views = show(&config(), "bob");
        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json[0]["name"], "bob");
        assert_eq!(json[0]["environments"][0]["engine_id"], "111");
        assert_eq!(json[0]["environments"][2]["placeholder"], true);
    }
}
