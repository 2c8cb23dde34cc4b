mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod state;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::monitor::{self, RunCommandArgs};
use crate::config::{AppConfig, config_directory};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::bugzilla::BugzillaClient;
use crate::infra::git::GitCli;

#[derive(Parser)]
#[command(
    name = "commit-monitor",
    author,
    version,
    about = "Comments on Bugzilla bugs referenced by new git commits"
)]
struct Cli {
    /// Directory holding commit_monitor.yml, bugzilla_credentials.yml and
    /// commit_monitor_repos.yml.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll tracked branches forever.
    Run(RunArgs),
    /// Run a single poll cycle and exit.
    Once,
    /// Inspect the configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Override the configured polling interval, in seconds (at least 1).
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

async fn run(cli: Cli) -> AppResult<()> {
    let config_dir = config_directory(cli.config_dir);

    match cli.command {
        Commands::Config(args) => config_cmd::run(&config_dir, args.command),
        Commands::Run(args) => {
            let ctx = build_context(AppConfig::load(&config_dir)?)?;
            monitor::run(
                &ctx,
                RunCommandArgs {
                    interval: args.interval.map(Duration::from_secs),
                },
            )
            .await
        }
        Commands::Once => {
            let ctx = build_context(AppConfig::load(&config_dir)?)?;
            let report = monitor::run_once(&ctx).await?;
            info!(
                branches = report.branches,
                commits = report.commits,
                comments = report.comments,
                skipped = report.skipped_updates,
                "poll cycle complete"
            );
            Ok(())
        }
    }
}

fn build_context(config: AppConfig) -> AppResult<AppContext> {
    let git = Arc::new(GitCli::new());
    let issue_tracker = Arc::new(BugzillaClient::new(&config.credentials));
    AppContext::new(config, git, issue_tracker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_interval(value: &str) -> Result<Option<u64>, clap::Error> {
        let cli = Cli::try_parse_from(["commit-monitor", "run", "--interval", value])?;
        match cli.command {
            Commands::Run(args) => Ok(args.interval),
            _ => panic!("expected the run subcommand"),
        }
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(parse_interval("0").is_err());
    }

    #[test]
    fn accepts_positive_interval() {
        assert_eq!(parse_interval("5").unwrap(), Some(5));
    }

    #[test]
    fn interval_is_optional() {
        let cli = Cli::try_parse_from(["commit-monitor", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(RunArgs { interval: None })));
    }
}
