use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub const SETTINGS_FILE_NAME: &str = "commit_monitor.yml";
pub const CREDENTIALS_FILE_NAME: &str = "bugzilla_credentials.yml";
pub const STATE_FILE_NAME: &str = "commit_monitor_repos.yml";

const CONFIG_DIR_ENV: &str = "COMMIT_MONITOR_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Contents of `commit_monitor.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Only bugs filed against this product receive comments.
    pub product: String,
    /// Directory holding one working copy per tracked repository.
    pub repository_base: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn validate(mut self) -> AppResult<Self> {
        self.product = self.product.trim().to_string();
        if self.product.is_empty() {
            return Err(AppError::Configuration(
                "product must not be empty".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Configuration(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        self.repository_base = expand_home(&self.repository_base);
        if !self.repository_base.is_dir() {
            return Err(AppError::Configuration(format!(
                "repository_base {} is not a directory",
                self.repository_base.display()
            )));
        }
        Ok(self)
    }
}

/// Contents of `bugzilla_credentials.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerCredentials {
    pub bugzilla_uri: String,
    pub username: String,
    pub password: String,
}

impl TrackerCredentials {
    fn validate(mut self) -> AppResult<Self> {
        self.bugzilla_uri = self.bugzilla_uri.trim().trim_end_matches('/').to_string();
        if !(self.bugzilla_uri.starts_with("https://") || self.bugzilla_uri.starts_with("http://"))
        {
            return Err(AppError::Configuration(format!(
                "bugzilla_uri must be an http(s) URL, got '{}'",
                self.bugzilla_uri
            )));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::Configuration(
                "bugzilla username must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_dir: PathBuf,
    pub settings: MonitorSettings,
    pub credentials: TrackerCredentials,
}

impl AppConfig {
    pub fn load(config_dir: &Path) -> AppResult<Self> {
        let settings = read_yaml::<MonitorSettings>(&config_dir.join(SETTINGS_FILE_NAME))?
            .validate()?;
        let credentials =
            read_yaml::<TrackerCredentials>(&config_dir.join(CREDENTIALS_FILE_NAME))?
                .validate()?;

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            settings,
            credentials,
        })
    }

    pub fn state_file_path(&self) -> PathBuf {
        self.config_dir.join(STATE_FILE_NAME)
    }

    pub fn repository_path(&self, repo: &str) -> PathBuf {
        self.settings.repository_base.join(repo)
    }
}

/// Explicit override, then the environment, then `./config`.
pub fn config_directory(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = fs::read_to_string(path).map_err(|err| {
        AppError::Configuration(format!("unable to read {}: {err}", path.display()))
    })?;
    serde_yaml::from_str(&contents)
        .map_err(|err| AppError::Configuration(format!("invalid {}: {err}", path.display())))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &Path, settings: &str, credentials: &str) {
        fs::write(dir.join(SETTINGS_FILE_NAME), settings).unwrap();
        fs::write(dir.join(CREDENTIALS_FILE_NAME), credentials).unwrap();
    }

    const CREDENTIALS: &str =
        "bugzilla_uri: https://bugzilla.example.com/\nusername: bot@example.com\npassword: hunter22\n";

    #[test]
    fn loads_valid_configuration() {
        let dir = TempDir::new().unwrap();
        let settings = format!(
            "product: ManageIQ\nrepository_base: {}\n",
            dir.path().display()
        );
        write_config(dir.path(), &settings, CREDENTIALS);

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.settings.product, "ManageIQ");
        assert_eq!(config.settings.poll_interval(), Duration::from_secs(60));
        assert_eq!(
            config.credentials.bugzilla_uri,
            "https://bugzilla.example.com"
        );
        assert_eq!(config.repository_path("R"), dir.path().join("R"));
        assert_eq!(config.state_file_path(), dir.path().join(STATE_FILE_NAME));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let result = AppConfig::load(dir.path());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn rejects_empty_product() {
        let dir = TempDir::new().unwrap();
        let settings = format!("product: ' '\nrepository_base: {}\n", dir.path().display());
        write_config(dir.path(), &settings, CREDENTIALS);
        assert!(AppConfig::load(dir.path()).is_err());
    }

    #[test]
    fn rejects_missing_repository_base() {
        let dir = TempDir::new().unwrap();
        let settings = format!(
            "product: ManageIQ\nrepository_base: {}\n",
            dir.path().join("nope").display()
        );
        write_config(dir.path(), &settings, CREDENTIALS);
        assert!(AppConfig::load(dir.path()).is_err());
    }

    #[test]
    fn rejects_non_http_tracker() {
        let dir = TempDir::new().unwrap();
        let settings = format!("product: ManageIQ\nrepository_base: {}\n", dir.path().display());
        write_config(
            dir.path(),
            &settings,
            "bugzilla_uri: bugzilla.example.com\nusername: bot\npassword: x\n",
        );
        assert!(AppConfig::load(dir.path()).is_err());
    }

    #[test]
    fn explicit_directory_wins() {
        let dir = config_directory(Some(PathBuf::from("/etc/monitor")));
        assert_eq!(dir, PathBuf::from("/etc/monitor"));
    }
}
