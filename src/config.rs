use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::TagPattern;
use crate::error::{ReleaseError, Result};

const PROJECT_CONFIG: &str = ".github-tag-release.toml";
const USER_CONFIG: &str = "github-tag-release.toml";

/// Represents the complete configuration for github-tag-release.
///
/// Contains the tag naming pattern, the remote to push to, release text
/// templates, network timeouts and the retry policy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_tag_message")]
    pub tag_message: String,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_tag_message() -> String {
    "Release {tag}".to_string()
}

fn default_release_name() -> String {
    "{tag}".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_multiplier() -> u32 {
    2
}

/// Text and visibility of the hosted release.
///
/// `name` and `body` accept the `{tag}` and `{version}` placeholders.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_release_name")]
    pub name: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub draft: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            name: default_release_name(),
            body: String::new(),
            draft: false,
        }
    }
}

/// Timeouts and endpoints for remote calls.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            timeout_secs: default_timeout_secs(),
            api_url: default_api_url(),
        }
    }
}

/// Backoff settings for transient remote failures.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tag_pattern: default_tag_pattern(),
            remote: default_remote(),
            tag_message: default_tag_message(),
            release: ReleaseConfig::default(),
            network: NetworkConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Parse and check the configured tag pattern
    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(&self.tag_pattern)
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        self.tag_pattern()?;
        if self.remote.trim().is_empty() {
            return Err(ReleaseError::config("remote must not be empty"));
        }
        if self.network.timeout_secs == 0 {
            return Err(ReleaseError::config("network.timeout_secs must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ReleaseError::config("retry.max_attempts must be at least 1"));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ReleaseError::config(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms",
            ));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `.github-tag-release.toml` in the project directory
/// 3. `github-tag-release.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `project_dir` - Working tree of the repository being released
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration, validated
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>, project_dir: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(PathBuf::from(path)),
        None => find_config_file(project_dir),
    };

    let config = match path {
        Some(path) => {
            debug!("loading configuration from {}", path.display());
            let text = fs::read_to_string(&path).map_err(|e| {
                ReleaseError::config(format!("cannot read '{}': {}", path.display(), e))
            })?;
            toml::from_str::<Config>(&text).map_err(|e| {
                ReleaseError::config(format!("cannot parse '{}': {}", path.display(), e))
            })?
        }
        None => {
            debug!("no configuration file found, using defaults");
            Config::default()
        }
    };

    config.validate()?;
    Ok(config)
}

fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    let project = project_dir.join(PROJECT_CONFIG);
    if project.exists() {
        return Some(project);
    }
    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG))
        .filter(|path| path.exists())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// API token from `GITHUB_TOKEN`, falling back to `GH_TOKEN`
pub fn github_token() -> Option<String> {
    non_empty_var("GITHUB_TOKEN").or_else(|| non_empty_var("GH_TOKEN"))
}

/// `owner/name` slug from `GITHUB_REPOSITORY`
pub fn github_repository() -> Option<String> {
    non_empty_var("GITHUB_REPOSITORY")
}

/// API base URL: `GITHUB_API_URL` when set, else the configured one
pub fn github_api_url(config: &Config) -> String {
    non_empty_var("GITHUB_API_URL").unwrap_or_else(|| config.network.api_url.clone())
}
