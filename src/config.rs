use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitoring: MonitoringConfig,
    pub sinks: SinksConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub interval_seconds: u64,
    pub command_timeout_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        MonitoringConfig {
            interval_seconds: 5,
            command_timeout_ms: 5000,
        }
    }
}

impl MonitoringConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub file_log: bool,
    pub file_log_path: PathBuf,
    /// Endpoint receiving one JSON POST per snapshot; unset disables it.
    pub api_url: Option<String>,
    pub api_timeout_ms: u64,
}

impl Default for SinksConfig {
    fn default() -> Self {
        SinksConfig {
            file_log: true,
            file_log_path: PathBuf::from("system_usage.log"),
            api_url: None,
            api_timeout_ms: 5000,
        }
    }
}

impl SinksConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hostpulse").join("config.toml"))
}

/// Config from the default location. Falls back to defaults when the file is
/// absent, and hands back the error when it exists but cannot be used.
pub fn load_config() -> (Config, Option<ConfigError>) {
    match config_path() {
        Some(path) => load_config_or_default(&path),
        None => (Config::default(), None),
    }
}

pub fn load_config_or_default(path: &Path) -> (Config, Option<ConfigError>) {
    if !path.exists() {
        return (Config::default(), None);
    }
    match load_config_from_path(path) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    }
}

/// Config from an explicit path. Missing or invalid files are errors.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
