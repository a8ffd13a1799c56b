//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/goalcore/goalcore.toml`
//! 3. Local config: `<dir>/.goalcore.toml` (usually the working directory)
//! 4. Environment variables: `GOALCORE_*` prefix, `__` between nested keys

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult, ConfigIoExt};
use crate::domain::retry::{DEFAULT_SLOW_UPSTREAMS, SLOW_UPSTREAM_FLOOR};
use crate::domain::RetryPolicy;
use crate::infrastructure::sources::ALL_CATEGORIES_ENDPOINT;

/// Retry limits as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_secs: f64,
    pub exponential_backoff: bool,
    /// Upstream names that get the minimum delay floor (case-insensitive substring match)
    pub slow_upstreams: Vec<String>,
    pub slow_upstream_floor_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from_policy(&RetryPolicy::standard())
    }
}

impl RetrySettings {
    pub fn batch() -> Self {
        Self::from_policy(&RetryPolicy::batch())
    }

    fn from_policy(policy: &RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            base_delay_secs: policy.base_delay.as_secs_f64(),
            exponential_backoff: policy.exponential_backoff,
            slow_upstreams: DEFAULT_SLOW_UPSTREAMS.iter().map(|s| s.to_string()).collect(),
            slow_upstream_floor_secs: SLOW_UPSTREAM_FLOOR.as_secs_f64(),
        }
    }

    /// Validate and convert into a domain policy.
    pub fn to_policy(&self) -> ApplicationResult<RetryPolicy> {
        let policy = RetryPolicy::from_secs(
            self.max_retries,
            self.base_delay_secs,
            self.exponential_backoff,
        )?
        .with_slow_upstreams(&self.slow_upstreams)
        .with_slow_upstream_floor_secs(self.slow_upstream_floor_secs)?;
        Ok(policy)
    }
}

/// Unified configuration for goalcore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Origin of the platform, `/api/...` is appended
    pub base_url: String,
    /// API token sent as `Authorization: Token ...`
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Endpoint listing every category
    pub categories_endpoint: String,
    /// Limits for interactive calls
    pub retry: RetrySettings,
    /// Limits for bulk calls
    pub batch_retry: RetrySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_token: None,
            request_timeout_secs: 30,
            categories_endpoint: ALL_CATEGORIES_ENDPOINT.into(),
            retry: RetrySettings::default(),
            batch_retry: RetrySettings::batch(),
        }
    }
}

/// Get the XDG config directory for goalcore.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "goalcore").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("goalcore.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".goalcore.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.goalcore.toml`
    pub fn load(local_dir: Option<&Path>) -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref(), local_dir)
    }

    /// Load settings from an explicit global config file (if any) instead of
    /// the XDG location.
    pub fn load_from(global: Option<&Path>, local_dir: Option<&Path>) -> ApplicationResult<Self> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global {
            if global_path.exists() {
                builder = builder.add_source(Self::file_source(global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                builder = builder.add_source(Self::file_source(&local_path)?);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("GOALCORE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("retry.slow_upstreams")
                .with_list_parse_key("batch_retry.slow_upstreams")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    fn file_source(path: &Path) -> ApplicationResult<File<config::FileSourceString, FileFormat>> {
        let content = std::fs::read_to_string(path).config_file_context("read", path)?;
        Ok(File::from_str(&content, FileFormat::Toml))
    }

    /// Reject settings the retry policy cannot be built from.
    pub fn validate(&self) -> ApplicationResult<()> {
        self.retry.to_policy()?;
        self.batch_retry.to_policy()?;
        if self.base_url.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "base_url must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# goalcore configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/goalcore/goalcore.toml
#   Local:  ./.goalcore.toml
#   Env:    GOALCORE_* environment variables, e.g. GOALCORE_RETRY__MAX_RETRIES=5

# Origin of the platform; requests go to <base_url>/api/<path>/
# base_url = "http://localhost:8000"

# Token sent as "Authorization: Token <api_token>"
# api_token = "..."

# Per-request timeout in seconds (timed out requests are not retried)
# request_timeout_secs = 30

# Endpoint listing every category
# categories_endpoint = "categories/all"

[retry]
# max_retries = 3
# base_delay_secs = 1.0
# exponential_backoff = true
# Upstreams that always wait at least slow_upstream_floor_secs
# slow_upstreams = ["igdb"]
# slow_upstream_floor_secs = 0.3

[batch_retry]
# max_retries = 2
# base_delay_secs = 0.5
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
