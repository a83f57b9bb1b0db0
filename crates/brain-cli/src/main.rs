mod cmd;
mod output;
mod root;

use brain_core::envs::ALL_AGENTS;
use brain_core::{paths, BrainError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "brain",
    about = "Agent Engine promotion helper and Slack gateway for Bob's Brain",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from config/agent_engine_envs.yaml or .git/)
    #[arg(long, global = true, env = "BRAIN_ROOT")]
    root: Option<PathBuf>,

    /// Promotion config file (default: <root>/config/agent_engine_envs.yaml)
    #[arg(long, global = true, env = "BRAIN_ENVS_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show agent engine mappings, or a promotion path between two environments
    Show {
        /// Agent name, or `all`
        #[arg(long, default_value = ALL_AGENTS)]
        agent: String,

        /// Source environment of the promotion path
        #[arg(long, requires = "to_env")]
        from_env: Option<String>,

        /// Target environment of the promotion path
        #[arg(long, requires = "from_env")]
        to_env: Option<String>,
    },

    /// Check that an environment has no placeholder engine ids (exit 2 if any remain)
    Validate {
        /// Environment to check, e.g. `prod`
        #[arg(long)]
        env: String,

        /// Agent name, or `all`
        #[arg(long, default_value = ALL_AGENTS)]
        agent: String,
    },

    /// Run the Slack webhook gateway
    Gateway {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// POST a synthetic app_mention event to a running gateway
    Simulate {
        /// Gateway base URL
        #[arg(long, default_value = cmd::simulate::DEFAULT_URL)]
        url: String,

        /// Message text; the bot mention is prepended
        #[arg(long, default_value = cmd::simulate::DEFAULT_TEXT)]
        text: String,

        /// Sign the request like Slack does
        #[arg(long, env = "SLACK_SIGNING_SECRET")]
        signing_secret: Option<String>,
    },
}

fn main() {
    // Usage errors share exit 1 with config errors; 2 stays reserved for placeholders.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let default_level = match &cli.command {
        Commands::Gateway { .. } | Commands::Simulate { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| paths::envs_config_path(&root::resolve_root(cli.root.as_deref())));

    let result = match cli.command {
        Commands::Show {
            agent,
            from_env,
            to_env,
        } => match (from_env, to_env) {
            (Some(from), Some(to)) => {
                cmd::show::run_path(&config_path, &from, &to, &agent, cli.json)
            }
            _ => cmd::show::run(&config_path, &agent, cli.json),
        },
        Commands::Validate { env, agent } => {
            cmd::validate::run(&config_path, &env, &agent, cli.json)
        }
        Commands::Gateway { port } => cmd::gateway::run(port),
        Commands::Simulate {
            url,
            text,
            signing_secret,
        } => cmd::simulate::run(&url, &text, signing_secret.as_deref(), cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// `2` when an environment still has placeholders, `1` for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BrainError>())
        .map_or(1, BrainError::exit_code)
}
