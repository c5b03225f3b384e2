use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_OWNERSHIP_CONFIG: &str = "OWNERSHIP_CONFIG";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const MIN_FETCH_TIMEOUT_SECS: u64 = 1;
const MAX_FETCH_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 1_000;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OwnershipConfig {
    #[serde(default)]
    pub remote: RemoteConfigToml,
    #[serde(default)]
    pub paging: PagingConfigToml,
    #[serde(default)]
    pub logging: LoggingConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfigToml {
    /// Deadline applied to every remote tracker call.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for RemoteConfigToml {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagingConfigToml {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for PagingConfigToml {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfigToml {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfigToml {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteRuntimeConfig {
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingRuntimeConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl OwnershipConfig {
    pub fn remote_runtime(&self) -> RemoteRuntimeConfig {
        RemoteRuntimeConfig {
            fetch_timeout: Duration::from_secs(self.remote.fetch_timeout_secs),
        }
    }

    pub fn paging_runtime(&self) -> PagingRuntimeConfig {
        PagingRuntimeConfig {
            default_page_size: self.paging.default_page_size,
            max_page_size: self.paging.max_page_size,
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.logging.filter
    }
}

impl Default for RemoteRuntimeConfig {
    fn default() -> Self {
        OwnershipConfig::default().remote_runtime()
    }
}

pub fn load_from_env() -> Result<OwnershipConfig, ConfigError> {
    let path = config_path_from_env()?;
    load_from_path(path)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<OwnershipConfig, ConfigError> {
    load_or_create_config(path.as_ref())
}

/// Parses a configuration document without touching the filesystem.
pub fn parse_str(raw: &str) -> Result<OwnershipConfig, ConfigError> {
    let mut config: OwnershipConfig = toml::from_str(raw).map_err(|err| {
        ConfigError::configuration(format!("Failed to parse OWNERSHIP_CONFIG: {err}"))
    })?;
    normalize_config(&mut config);
    Ok(config)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home
        .join(".config")
        .join("issue-ownership")
        .join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_OWNERSHIP_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "OWNERSHIP_CONFIG contained invalid UTF-8",
        )),
    }
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

fn persist_config(path: &Path, config: &OwnershipConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to serialize OWNERSHIP_CONFIG for {}: {err}",
            path.display()
        ))
    })?;

    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to write OWNERSHIP_CONFIG to {}: {err}",
            path.display()
        ))
    })
}

fn load_or_create_config(path: &Path) -> Result<OwnershipConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::configuration(format!(
                            "Failed to create parent directory {} for OWNERSHIP_CONFIG: {err}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let default_config = OwnershipConfig::default();
            persist_config(path, &default_config)?;
            return Ok(default_config);
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read OWNERSHIP_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config: OwnershipConfig = toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse OWNERSHIP_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    if normalize_config(&mut config) {
        persist_config(path, &config)?;
    }

    Ok(config)
}

fn normalize_config(config: &mut OwnershipConfig) -> bool {
    let mut changed = false;
    changed |= normalize_remote_config(&mut config.remote);
    changed |= normalize_paging_config(&mut config.paging);
    changed |= normalize_non_empty_string(&mut config.logging.filter, default_log_filter());
    changed
}

pub fn normalize_remote_config(config: &mut RemoteConfigToml) -> bool {
    let clamped = config
        .fetch_timeout_secs
        .clamp(MIN_FETCH_TIMEOUT_SECS, MAX_FETCH_TIMEOUT_SECS);
    if clamped == config.fetch_timeout_secs {
        return false;
    }
    config.fetch_timeout_secs = clamped;
    true
}

pub fn normalize_paging_config(config: &mut PagingConfigToml) -> bool {
    let mut changed = false;
    let max_page_size = config.max_page_size.clamp(1, MAX_PAGE_SIZE);
    if max_page_size != config.max_page_size {
        config.max_page_size = max_page_size;
        changed = true;
    }
    let default_page_size = config.default_page_size.clamp(1, config.max_page_size);
    if default_page_size != config.default_page_size {
        config.default_page_size = default_page_size;
        changed = true;
    }
    changed
}

fn normalize_non_empty_string(value: &mut String, default: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        *value = default;
        return true;
    }
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
        return true;
    }
    false
}
