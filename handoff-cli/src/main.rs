//! Handoff CLI - Command line interface for Handoff
//!
//! Quality gates and stage handoffs for an agent development workflow.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use handoff_core::config::CliOverrides;
use handoff_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    AdvanceArgs, DiffArgs, GateArgs, PickupArgs, PlanArgs, PrsArgs, SendBackArgs, SpikeArgs,
    StartArgs, StatusArgs, VerifyArgs, Workspace,
};

/// Handoff: quality gates between agent stages
#[derive(Parser, Debug)]
#[command(name = "handoff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Working tree containing the planning directory
    #[arg(long, global = true, default_value = ".")]
    workdir: PathBuf,

    /// Config file (defaults to ~/.config/handoff/config.toml)
    #[arg(long, global = true, env = "HANDOFF_CONFIG")]
    config: Option<PathBuf>,

    /// Planning directory (overrides config and env)
    #[arg(long, global = true)]
    planning_dir: Option<PathBuf>,

    /// Azure DevOps scripts directory (overrides config and env)
    #[arg(long, global = true)]
    scripts_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Begin tracking a work item
    Start(StartArgs),

    /// List sprint work items to pick up
    Pickup(PickupArgs),

    /// Show the work item's stage, artifacts and history
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Manage PLAN.md
    Plan(PlanArgs),

    /// Evaluate the current stage's gate
    Gate(GateArgs),

    /// Evaluate the gate and hand off to the next stage
    Advance(AdvanceArgs),

    /// Route a failed gate back to the producing stage
    SendBack(SendBackArgs),

    /// Write the implementation verification report
    Verify(VerifyArgs),

    /// Record a time-boxed spike
    Spike(SpikeArgs),

    /// List pull requests awaiting team review
    Prs(PrsArgs),

    /// Show the files changed by a pull request
    Diff(DiffArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose raises the default
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// 2 for a blocked transition, 1 for anything else
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<handoff_core::Error>() {
        Some(e) if e.is_blocked() => 2,
        _ => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        planning_dir: cli.planning_dir.clone(),
        scripts_dir: cli.scripts_dir.clone(),
    };
    let config = Config::load_with_overrides(&overrides)?;

    tracing::debug!(
        workdir = %cli.workdir.display(),
        planning_dir = %config.planning.dir.display(),
        build = %config.build.command_line(),
        test = %config.test.command_line(),
        "Configuration loaded"
    );

    let ws = Workspace::new(cli.workdir, config);

    match cli.command {
        Some(Commands::Start(args)) => args.execute(&ws).await,
        Some(Commands::Pickup(args)) => args.execute(&ws).await,
        Some(Commands::Status(args)) => args.execute(&ws).await,
        Some(Commands::Plan(args)) => args.execute(&ws).await,
        Some(Commands::Gate(args)) => args.execute(&ws).await,
        Some(Commands::Advance(args)) => args.execute(&ws).await,
        Some(Commands::SendBack(args)) => args.execute(&ws).await,
        Some(Commands::Verify(args)) => args.execute(&ws).await,
        Some(Commands::Spike(args)) => args.execute(&ws).await,
        Some(Commands::Prs(args)) => args.execute(&ws).await,
        Some(Commands::Diff(args)) => args.execute(&ws).await,
        Some(Commands::Config) => show_config(&ws.config, overrides.config_path.as_deref()),
        None => {
            println!("Handoff - quality gates between agent stages");
            println!();
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn show_config(config: &Config, explicit: Option<&std::path::Path>) -> anyhow::Result<()> {
    println!("Handoff Configuration");
    println!("=====================");
    println!();
    print!("{}", config.to_toml()?);
    println!();

    let path = explicit
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use handoff_core::Stage;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_advance_flags() {
        let cli = Cli::try_parse_from([
            "handoff", "advance", "--build-exit", "0", "--passed", "10", "--failed", "0",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Advance(args)) => {
                assert_eq!(args.signals.build_exit, Some(0));
                assert_eq!(args.signals.passed, Some(10));
                assert!(!args.signals.run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_prs_flags() {
        let cli = Cli::try_parse_from([
            "handoff", "prs", "--team-id", "team-guid", "--user-id", "user-guid", "--status",
            "all",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Prs(args)) => {
                assert_eq!(args.team_id, "team-guid");
                assert_eq!(args.user_id.as_deref(), Some("user-guid"));
                assert!(!args.include_own);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_blocked_transition_exit_code() {
        let blocked: anyhow::Error = handoff_core::Error::BlockedTransition {
            stage: Stage::Coder,
            failed: vec!["build".to_string()],
            return_to: Stage::Coder,
        }
        .into();
        assert_eq!(exit_code_for(&blocked), 2);

        let other = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&other), 1);
    }
}
