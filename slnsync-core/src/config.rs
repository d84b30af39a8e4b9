//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.slnsync/
//!   config.yaml   (optional: every key has a default)
//! ```
//!
//! ```yaml
//! retry:
//!   max_attempts: 5
//!   delay_ms: 5000
//! format:
//!   project_type_guid: "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}"
//!   global_marker: Global
//!   identity_element: ProjectGuid
//! ```
//!
//! Like the rest of the crate, every loader has an `_at(home)` form used by
//! tests and a no-arg form that derives home from `dirs::home_dir()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::{RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::solution::SolutionFormat;

/// Retry knobs as they appear on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        RetryPolicy {
            max_attempts: s.max_attempts,
            delay: Duration::from_millis(s.delay_ms),
        }
    }
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub retry: RetrySettings,
    pub format: SolutionFormat,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

/// `<home>/.slnsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".slnsync").join("config.yaml")
}

/// Load `<home>/.slnsync/config.yaml`, falling back to defaults if absent.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

/// Load an explicitly named config file. A missing file is an error here.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_process_constants() {
        let config = Config::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.format.global_marker, "Global");
        assert_eq!(config.format.identity_element, "ProjectGuid");
    }

    #[test]
    fn serde_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: Config = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, config);
    }
}
