//! Engine configuration.
//!
//! Resolution order, lowest to highest precedence:
//! - built-in defaults
//! - `~/.fetch-readiness/readiness.toml` (or an explicit path)
//! - `FETCH_READINESS_MIN_DELAY_MS`

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ReadinessError, Result};

pub const DEFAULT_MIN_DELAY_MS: u64 = 2_000;
pub const MIN_DELAY_ENV_VAR: &str = "FETCH_READINESS_MIN_DELAY_MS";

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".fetch-readiness/readiness.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Debounce floor: minimum dwell after the baseline before firing.
    pub min_delay_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
        }
    }
}

impl ReadinessConfig {
    pub fn with_min_delay_ms(min_delay_ms: u64) -> Self {
        Self { min_delay_ms }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ReadinessError::HomeDirNotFound)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads configuration from `path` (or the default location) and applies
/// the environment override. A missing file yields defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<ReadinessConfig> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    resolve_config(&config_path, env::var(MIN_DELAY_ENV_VAR).ok())
}

fn resolve_config(path: &Path, env_value: Option<String>) -> Result<ReadinessConfig> {
    let config = load_config_file(path)?;
    apply_env_override(config, env_value)
}

pub fn load_config_file(path: &Path) -> Result<ReadinessConfig> {
    if !path.exists() {
        return Ok(ReadinessConfig::default());
    }

    let content = fs_err::read_to_string(path).map_err(|source| ReadinessError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<ReadinessConfig>(&content).map_err(|err| ReadinessError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

pub fn apply_env_override(
    mut config: ReadinessConfig,
    value: Option<String>,
) -> Result<ReadinessConfig> {
    let Some(value) = value else {
        return Ok(config);
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(config);
    }

    config.min_delay_ms = trimmed
        .parse::<u64>()
        .map_err(|_| ReadinessError::InvalidEnvOverride {
            var: MIN_DELAY_ENV_VAR.to_string(),
            value: value.clone(),
        })?;
    Ok(config)
}
