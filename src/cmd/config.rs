use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::{AppConfig, CREDENTIALS_FILE_NAME, SETTINGS_FILE_NAME};
use crate::error::AppResult;
use crate::state::StateStore;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the loaded configuration (secrets masked).
    Show,
    /// Load and validate settings, credentials and the state file.
    Check,
}

pub fn run(config_dir: &Path, command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(config_dir),
        ConfigCommand::Check => run_check(config_dir),
    }
}

fn run_show(config_dir: &Path) -> AppResult<()> {
    let cfg = AppConfig::load(config_dir)?;

    println!(
        "Settings file: {}",
        config_dir.join(SETTINGS_FILE_NAME).display()
    );
    println!("Product: {}", cfg.settings.product);
    println!(
        "Repository base: {}",
        cfg.settings.repository_base.display()
    );
    println!("Poll interval: {}s", cfg.settings.poll_interval_secs);
    println!(
        "Credentials file: {}",
        config_dir.join(CREDENTIALS_FILE_NAME).display()
    );
    println!("Bugzilla URI: {}", cfg.credentials.bugzilla_uri);
    println!("Bugzilla username: {}", cfg.credentials.username);
    println!(
        "Bugzilla password: {}",
        mask_secret(&cfg.credentials.password)
    );
    println!("State file: {}", cfg.state_file_path().display());

    Ok(())
}

fn run_check(config_dir: &Path) -> AppResult<()> {
    let cfg = AppConfig::load(config_dir)?;
    let store = StateStore::new(cfg.state_file_path());
    let state = store.load()?;
    println!("State file: {}", store.path().display());

    let mut missing = 0;
    for (repo, branch) in state.tracked() {
        let path = cfg.repository_path(&repo);
        if path.is_dir() {
            println!("{repo}/{branch}: {}", path.display());
        } else {
            missing += 1;
            println!("{repo}/{branch}: missing working copy {}", path.display());
        }
    }

    println!(
        "{} tracked branches, {} missing working copies.",
        state.branch_count(),
        missing
    );
    Ok(())
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "<not set>".to_string(),
        len if len > 6 => {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[len - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        _ => "***".to_string(),
    }
}
