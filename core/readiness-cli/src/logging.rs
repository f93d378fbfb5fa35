//! Subscriber setup. `FETCH_READINESS_DEBUG_LOG` forces debug output;
//! otherwise `RUST_LOG` applies, defaulting to `info`.

use clap::ValueEnum;
use std::env;
use std::io;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_ENV_VAR: &str = "FETCH_READINESS_DEBUG_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

pub fn init(format: LogFormat) {
    let filter = if debug_enabled(env::var(DEBUG_LOG_ENV_VAR).ok().as_deref()) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_target(false).init(),
    }
}

fn debug_enabled(value: Option<&str>) -> bool {
    value
        .map(|value| matches!(value, "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
