use crate::cmd::{load_config, print_versions};
use crate::output::print_json;
use brain_core::envs::WarnLevel;
use brain_core::paths;
use brain_core::promotion;
use std::path::Path;

pub fn run(config_path: &Path, env: &str, agent: &str, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let warnings = config.lint();
    let report = promotion::validate(&config, env, agent);

    if json {
        print_json(&serde_json::json!({
            "env": report.env,
            "ready": report.is_ready(),
            "checked": report.checked,
            "outstanding": report.outstanding,
            "warnings": warnings,
        }))?;
    } else {
        print_versions(&config);
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
        println!();
        println!(
            "Environment: {env} ({} agent(s) checked)",
            report.checked.len()
        );
        if report.is_ready() {
            println!("VALIDATION: PASS - all engine IDs configured");
        } else {
            println!(
                "VALIDATION: FAIL - {} agent(s) still hold placeholders:",
                report.outstanding.len()
            );
            for name in &report.outstanding {
                println!("  - {name}");
            }
            println!("\nTo fix:");
            println!("  1. Deploy the agents to {env}");
            println!("  2. Copy the engine IDs from the deployment output");
            println!("  3. Update {}", paths::ENVS_FILE);
        }
    }

    report.ensure_ready()?;
    Ok(())
}
