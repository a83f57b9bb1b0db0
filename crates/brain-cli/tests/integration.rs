#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENVS_YAML: &str = r##"
schema_version: "1.0.0"
app_version: "0.14.1"
agents:
  bob:
    description: "Bob - Slack assistant"
    directory: agents/bob
    environments:
      dev:
        engine_id: "5828234061910376448"
        status: deployed
        project: bobs-brain-dev
        region: us-central1
      stage:
        engine_id: TODO
        status: not_deployed
      prod:
        engine_id: TODO-after-stage
        status: not_deployed
  foreman:
    display_name: "iam-senior-adk-devops-lead"
    agent_dir: agents/iam_senior_adk_devops_lead
    environments:
      dev:
        engine_id: 1234
        status: deployed
      stage:
        engine_id: "9876"
        status: deployed
promotion:
  dev_to_stage:
    required_checks:
      - arv_gate
      - unit_tests
    manual_approval: false
  stage_to_prod:
    required_checks:
      - arv_gate
    manual_approval: true
    approval_channel: "#bob-releases"
"##;

fn brain(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("brain").unwrap();
    cmd.current_dir(dir.path())
        .env("BRAIN_ROOT", dir.path())
        .env_remove("BRAIN_ENVS_CONFIG");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) {
    std::fs::create_dir_all(dir.path().join("config")).unwrap();
    std::fs::write(dir.path().join("config/agent_engine_envs.yaml"), contents).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_config(&dir, ENVS_YAML);
    dir
}

// ---------------------------------------------------------------------------
// brain show
// ---------------------------------------------------------------------------

#[test]
fn show_all_lists_every_agent_with_versions() {
    let dir = project();
    brain(&dir)
        .args(["show", "--agent", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config Version: 1.0.0"))
        .stdout(predicate::str::contains("App Version: 0.14.1"))
        .stdout(predicate::str::contains("Agent: bob"))
        .stdout(predicate::str::contains("Agent: foreman"))
        .stdout(predicate::str::contains("5828234061910376448"))
        .stdout(predicate::str::contains("iam-senior-adk-devops-lead"));
}

#[test]
fn show_unknown_agent_is_empty_not_an_error() {
    let dir = project();
    brain(&dir)
        .args(["show", "--agent", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No agents match 'nobody'"));
}

#[test]
fn show_json_marks_placeholders() {
    let dir = project();
    let output = brain(&dir)
        .args(["--json", "show", "--agent", "bob"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["schema_version"], "1.0.0");
    let envs = value["agents"][0]["environments"].as_array().unwrap();
    let names: Vec<&str> = envs.iter().map(|e| e["env"].as_str().unwrap()).collect();
    assert_eq!(names, ["dev", "stage", "prod"]);
    assert_eq!(envs[0]["placeholder"], false);
    assert_eq!(envs[1]["placeholder"], true);
    assert_eq!(envs[2]["placeholder"], true);
}

#[test]
fn show_promotion_path_counts_placeholders_and_rules() {
    let dir = project();
    brain(&dir)
        .args(["show", "--from-env", "stage", "--to-env", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROMOTION PATH: STAGE -> PROD"))
        .stdout(predicate::str::contains("arv_gate"))
        .stdout(predicate::str::contains("#bob-releases"))
        // bob stage + bob prod + foreman prod (missing)
        .stdout(predicate::str::contains("Placeholders: 3"));
}

#[test]
fn explicit_config_flag_overrides_root() {
    let dir = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let path = other.path().join("envs.yaml");
    std::fs::write(&path, ENVS_YAML).unwrap();

    brain(&dir)
        .args(["show", "--agent", "foreman", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Agent: foreman"));
}

// ---------------------------------------------------------------------------
// brain validate
// ---------------------------------------------------------------------------

#[test]
fn validate_ready_environment_passes() {
    let dir = project();
    brain(&dir)
        .args(["validate", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VALIDATION: PASS"));
}

#[test]
fn validate_with_placeholders_exits_two_and_names_agents() {
    let dir = project();
    brain(&dir)
        .args(["validate", "--env", "prod"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("VALIDATION: FAIL - 2 agent(s)"))
        .stdout(predicate::str::contains("  - bob"))
        .stdout(predicate::str::contains("  - foreman"))
        .stderr(predicate::str::contains("bob, foreman"));
}

#[test]
fn validate_single_agent_via_staging_alias() {
    let dir = project();
    brain(&dir)
        .args(["validate", "--env", "staging", "--agent", "foreman"])
        .assert()
        .success();
    brain(&dir)
        .args(["validate", "--env", "staging", "--agent", "bob"])
        .assert()
        .code(2);
}

#[test]
fn validate_unknown_agent_is_outstanding() {
    let dir = project();
    brain(&dir)
        .args(["validate", "--env", "dev", "--agent", "ghost"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("  - ghost"));
}

#[test]
fn validate_json_reports_outstanding() {
    let dir = project();
    let output = brain(&dir)
        .args(["--json", "validate", "--env", "stage"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ready"], false);
    assert_eq!(value["outstanding"], serde_json::json!(["bob"]));
    assert_eq!(value["checked"], serde_json::json!(["bob", "foreman"]));
}

#[test]
fn validate_prints_lint_warnings_without_failing() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
schema_version: "one"
agents:
  bob:
    environments:
      dev:
        engine_id: "42"
        status: retired
"#,
    );
    brain(&dir)
        .args(["validate", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] schema_version 'one'"))
        .stdout(predicate::str::contains("unknown status 'retired'"));
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[test]
fn missing_config_exits_one() {
    let dir = TempDir::new().unwrap();
    brain(&dir)
        .args(["validate", "--env", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn malformed_yaml_exits_one() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "agents: [unclosed\n");
    brain(&dir)
        .args(["show", "--agent", "all"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

// ---------------------------------------------------------------------------
// Usage errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_flag_exits_one() {
    let dir = project();
    brain(&dir)
        .args(["show", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn half_promotion_path_exits_one() {
    let dir = project();
    brain(&dir)
        .args(["show", "--from-env", "dev"])
        .assert()
        .code(1);
}

#[test]
fn help_and_version_exit_zero() {
    let dir = project();
    brain(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"));
    brain(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
