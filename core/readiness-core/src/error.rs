//! Error types for readiness-core.
//!
//! The engine itself never fails; these cover configuration loading and
//! replay script handling around it.

use readiness_protocol::ErrorInfo;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid value for {var}: {value:?} (expected milliseconds)")]
    InvalidEnvOverride { var: String, value: String },

    // ─────────────────────────────────────────────────────────────────────
    // Replay Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Replay script rejected: {0}")]
    InvalidScript(ErrorInfo),
}

impl From<ErrorInfo> for ReadinessError {
    fn from(info: ErrorInfo) -> Self {
        ReadinessError::InvalidScript(info)
    }
}

/// Convenience type alias for Results using ReadinessError.
pub type Result<T> = std::result::Result<T, ReadinessError>;
