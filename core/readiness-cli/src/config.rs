//! `config` subcommand and the shared config resolution for other commands.

use readiness_core::{load_config, ReadinessConfig, ReadinessError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// File and environment first, then the command-line override on top.
pub fn resolve_config(
    path: Option<PathBuf>,
    min_delay_ms: Option<u64>,
) -> Result<ReadinessConfig, ReadinessError> {
    let mut config = load_config(path)?;
    if let Some(min_delay_ms) = min_delay_ms {
        config.min_delay_ms = min_delay_ms;
    }
    Ok(config)
}

pub fn run(path: Option<PathBuf>) -> Result<(), ConfigError> {
    let config = resolve_config(path, None)?;
    print!("{}", render(&config)?);
    Ok(())
}

fn render(config: &ReadinessConfig) -> Result<String, toml::ser::Error> {
    toml::to_string(config)
}
