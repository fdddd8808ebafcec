//! Plugin subsystem settings: home directory layout, remote endpoints, timeouts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::env::EnvConfigSource;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_GIT_BASE_URL: &str = "https://github.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONTENTS_TIMEOUT: Duration = Duration::from_secs(5);

const HOME_DIR_NAME: &str = ".vibe";
const PLUGINS_DIR: &str = "plugins";
const REGISTRY_FILE: &str = "plugins.json";
const COMMANDS_DIR: &str = "commands";

#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Application home; all plugin state lives below it.
    pub home: PathBuf,
    pub api_base_url: String,
    pub raw_base_url: String,
    pub git_base_url: String,
    /// Branch used for raw marketplace descriptor fetches.
    pub default_branch: String,
    /// Timeout for repository existence checks, listings and raw fetches.
    pub probe_timeout: Duration,
    /// Timeout for `contents` manifest probes.
    pub contents_timeout: Duration,
    pub user_agent: String,
}

impl PluginConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            git_base_url: DEFAULT_GIT_BASE_URL.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            contents_timeout: DEFAULT_CONTENTS_TIMEOUT,
            user_agent: concat!("vibe-plugins/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Configuration from `VIBE_*` environment variables, defaulting home to `~/.vibe`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&EnvConfigSource::new())
    }

    pub fn from_source(source: &EnvConfigSource) -> ConfigResult<Self> {
        let home = match source.get("home")? {
            Some(home) => PathBuf::from(home),
            None => default_home().ok_or(ConfigError::HomeNotFound { var: "VIBE_HOME" })?,
        };

        let mut config = Self::new(home);
        if let Some(url) = source.get("github.api_url")? {
            config.api_base_url = validate_url("github.api_url", url)?;
        }
        if let Some(url) = source.get("github.raw_url")? {
            config.raw_base_url = validate_url("github.raw_url", url)?;
        }
        if let Some(url) = source.get("github.git_url")? {
            config.git_base_url = validate_url("github.git_url", url)?;
        }
        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = trim_base(url.into());
        self
    }

    pub fn with_raw_base_url(mut self, url: impl Into<String>) -> Self {
        self.raw_base_url = trim_base(url.into());
        self
    }

    pub fn with_git_base_url(mut self, url: impl Into<String>) -> Self {
        self.git_base_url = trim_base(url.into());
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_contents_timeout(mut self, timeout: Duration) -> Self {
        self.contents_timeout = timeout;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `<home>/plugins`, one git checkout per plugin.
    pub fn plugins_dir(&self) -> PathBuf {
        self.home.join(PLUGINS_DIR)
    }

    /// `<home>/plugins.json`
    pub fn registry_file(&self) -> PathBuf {
        self.home.join(REGISTRY_FILE)
    }

    /// `<home>/commands`, materialized plugin prompt files.
    pub fn commands_dir(&self) -> PathBuf {
        self.home.join(COMMANDS_DIR)
    }
}

fn default_home() -> Option<PathBuf> {
    directories::UserDirs::new().map(|d| d.home_dir().join(HOME_DIR_NAME))
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn validate_url(key: &str, url: String) -> ConfigResult<String> {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://") {
        Ok(trim_base(url))
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an http(s) or file URL, got '{url}'"),
        })
    }
}
