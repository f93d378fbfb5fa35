//! fetch-readiness: replays session timelines through the readiness engine.
//!
//! ## Subcommands
//!
//! - `replay`: Runs a JSON replay script on a virtual clock and prints the
//!   action log (one JSON record per line)
//! - `config`: Prints the effective engine configuration as TOML
//!
//! Logs go to stderr so stdout carries only command output.

mod config;
mod logging;
mod replay;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use logging::LogFormat;

#[derive(Parser)]
#[command(name = "fetch-readiness")]
#[command(about = "Fetch-readiness debounce engine replay tool")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted timeline (use `-` to read the script from stdin)
    Replay {
        /// Path to the replay script
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Configuration file (defaults to ~/.fetch-readiness/readiness.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Debounce floor override in milliseconds
        #[arg(long, value_name = "MS")]
        min_delay_ms: Option<u64>,

        /// Print the whole report as pretty JSON instead of one record per line
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (defaults to ~/.fetch-readiness/readiness.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match cli.command {
        Commands::Replay {
            script,
            config,
            min_delay_ms,
            pretty,
        } => {
            if let Err(e) = replay::run(&script, config, min_delay_ms, pretty) {
                tracing::error!(error = %e, "fetch-readiness replay failed");
                std::process::exit(1);
            }
        }
        Commands::Config { config } => {
            if let Err(e) = config::run(config) {
                tracing::error!(error = %e, "fetch-readiness config failed");
                std::process::exit(1);
            }
        }
    }
}
