#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for apkidx
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/apkidx/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod mirrors;

pub use mirrors::{load_mirrors, parse_mirror_list};

use apkidx_errors::{ConfigError, Error};
use apkidx_types::{BasicCredentials, INDEX_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub debug: bool,
    /// Treat a run where no mirror verified as a failure
    #[serde(default)]
    pub require_verified: bool,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub client_cert: Option<PathBuf>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_mirror_list")]
    pub mirror_list: PathBuf,
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repo_path")]
    pub repo_path: String,
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,
    #[serde(default = "default_keys_url")]
    pub keys_url: String,
    #[serde(default)]
    pub fetch_keys: bool,
    /// Accept indexes whose signature only covers the first content stream
    #[serde(default = "default_allow_legacy")]
    pub allow_legacy: bool,
}

// Default implementations

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: constants::DEFAULT_TIMEOUT_SECS,
            connect_timeout: constants::DEFAULT_TIMEOUT_SECS,
            stagger_ms: constants::DEFAULT_STAGGER_MS,
            user_agent: None,
            client_cert: None,
            client_key: None,
            username: None,
            password: None,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            mirror_list: default_mirror_list(),
            keys_dir: default_keys_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            index_file_name: default_index_file_name(),
            keys_url: default_keys_url(),
            fetch_keys: false,
            allow_legacy: true,
        }
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

fn default_stagger_ms() -> u64 {
    constants::DEFAULT_STAGGER_MS
}

fn default_mirror_list() -> PathBuf {
    PathBuf::from(constants::DEFAULT_MIRROR_LIST)
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_KEYS_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_OUTPUT_DIR)
}

fn default_repo_path() -> String {
    constants::DEFAULT_REPO_PATH.to_string()
}

fn default_index_file_name() -> String {
    INDEX_FILE_NAME.to_string()
}

fn default_keys_url() -> String {
    constants::DEFAULT_KEYS_URL.to_string()
}

fn default_allow_legacy() -> bool {
    true
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    #[must_use]
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Basic-auth credentials, present when a username is configured
    #[must_use]
    pub fn credentials(&self) -> Option<BasicCredentials> {
        self.username.as_ref().map(|user| {
            BasicCredentials::new(user.clone(), self.password.clone().unwrap_or_default())
        })
    }
}

impl RepositoryConfig {
    /// Repository sub-path without leading or trailing slashes
    #[must_use]
    pub fn repo_path(&self) -> &str {
        self.repo_path.trim_matches('/')
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("apkidx").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // APKIDX_TIMEOUT
        if let Ok(timeout) = std::env::var("APKIDX_TIMEOUT") {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "APKIDX_TIMEOUT".to_string(),
                value: timeout,
            })?;
        }

        // APKIDX_STAGGER_MS
        if let Ok(stagger) = std::env::var("APKIDX_STAGGER_MS") {
            self.network.stagger_ms = stagger.parse().map_err(|_| ConfigError::InvalidValue {
                field: "APKIDX_STAGGER_MS".to_string(),
                value: stagger,
            })?;
        }

        // APKIDX_DEBUG
        if let Ok(debug) = std::env::var("APKIDX_DEBUG") {
            self.general.debug = match debug.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "APKIDX_DEBUG".to_string(),
                        value: debug,
                    }
                    .into())
                }
            };
        }

        if let Ok(dir) = std::env::var("APKIDX_KEYS_DIR") {
            self.paths.keys_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("APKIDX_OUTPUT") {
            self.paths.output_dir = PathBuf::from(dir);
        }

        if let Ok(list) = std::env::var("APKIDX_MIRRORS") {
            self.paths.mirror_list = PathBuf::from(list);
        }

        if let Ok(repo) = std::env::var("APKIDX_REPO") {
            self.repository.repo_path = repo;
        }

        Ok(())
    }

    /// Check cross-field constraints after all sources are merged
    ///
    /// # Errors
    ///
    /// Returns an error if a client certificate is configured without its key
    /// (or the reverse), or if the index file name contains a path separator.
    pub fn validate(&self) -> Result<(), Error> {
        match (&self.network.client_cert, &self.network.client_key) {
            (Some(_), None) => {
                return Err(ConfigError::MissingField {
                    field: "client_key".to_string(),
                }
                .into())
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingField {
                    field: "client_cert".to_string(),
                }
                .into())
            }
            _ => {}
        }

        let name = &self.repository.index_file_name;
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidValue {
                field: "index_file_name".to_string(),
                value: name.clone(),
            }
            .into());
        }

        Ok(())
    }
}
