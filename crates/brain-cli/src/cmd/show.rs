use crate::cmd::{load_config, print_versions};
use crate::output::{print_json, print_table};
use brain_core::promotion::{self, EnvironmentView};
use std::path::Path;

const NOT_SET: &str = "NOT SET";

// ---------------------------------------------------------------------------
// show --agent
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path, agent: &str, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let views = promotion::show(&config, agent);

    if json {
        return print_json(&serde_json::json!({
            "schema_version": config.schema_version,
            "app_version": config.app_version,
            "agents": views,
        }));
    }

    print_versions(&config);
    if views.is_empty() {
        println!("\nNo agents match '{agent}'.");
        return Ok(());
    }

    for view in &views {
        println!();
        println!("Agent: {}", view.name);
        println!("Description: {}", view.description.as_deref().unwrap_or("N/A"));
        println!("Directory: {}", view.directory.as_deref().unwrap_or("N/A"));
        if view.environments.is_empty() {
            println!("  (no environments)");
            continue;
        }
        let rows = view
            .environments
            .iter()
            .map(|e| {
                vec![
                    checkbox(e.placeholder).to_string(),
                    e.env.clone(),
                    e.engine_id.clone().unwrap_or_else(|| NOT_SET.to_string()),
                    e.status.clone(),
                    e.project.clone().unwrap_or_else(|| "N/A".to_string()),
                    e.region.clone().unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["", "ENV", "ENGINE ID", "STATUS", "PROJECT", "REGION"], rows);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show --from-env --to-env
// ---------------------------------------------------------------------------

pub fn run_path(
    config_path: &Path,
    from_env: &str,
    to_env: &str,
    agent: &str,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let path = promotion::promotion_path(&config, from_env, to_env, agent);

    if json {
        return print_json(&serde_json::json!({
            "schema_version": config.schema_version,
            "app_version": config.app_version,
            "promotion": path,
        }));
    }

    print_versions(&config);
    println!();
    println!(
        "PROMOTION PATH: {} -> {}",
        from_env.to_uppercase(),
        to_env.to_uppercase()
    );
    println!();

    let rows = path
        .rows
        .iter()
        .map(|row| {
            vec![
                row.agent.clone(),
                slot(row.from.as_ref()),
                slot(row.to.as_ref()),
            ]
        })
        .collect();
    print_table(&["AGENT", from_env, to_env], rows);

    if let Some(rule) = &path.rule {
        if !rule.required_checks.is_empty() {
            println!("\nRequired checks:");
            for check in &rule.required_checks {
                println!("  - {check}");
            }
        }
        if rule.manual_approval {
            println!(
                "\nManual approval required: yes ({})",
                rule.approval_channel.as_deref().unwrap_or("#general")
            );
        }
    }

    println!("\nPlaceholders: {}", path.placeholder_count);
    Ok(())
}

fn checkbox(placeholder: bool) -> &'static str {
    if placeholder {
        "[ ]"
    } else {
        "[x]"
    }
}

/// `engine_id (status)`, marked when it still needs a real value.
fn slot(view: Option<&EnvironmentView>) -> String {
    match view {
        None => format!("{NOT_SET} (TODO)"),
        Some(v) => {
            let id = v.engine_id.as_deref().unwrap_or(NOT_SET);
            if v.placeholder {
                format!("{id} [{}] (TODO)", v.status)
            } else {
                format!("{id} [{}]", v.status)
            }
        }
    }
}
