//! `replay` subcommand.
//!
//! ## Usage
//!
//! ```bash
//! fetch-readiness replay timeline.json
//! cat timeline.json | fetch-readiness replay - --min-delay-ms 500
//! ```

use fs_err as fs;
use readiness_core::replay::{run_script, ReplayReport};
use readiness_core::ReadinessError;
use readiness_protocol::parse_script;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::resolve_config;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

pub fn run(
    script_path: &Path,
    config_path: Option<PathBuf>,
    min_delay_ms: Option<u64>,
    pretty: bool,
) -> Result<(), ReplayError> {
    let config = resolve_config(config_path, min_delay_ms)?;
    let input = read_script(script_path)?;
    let script = parse_script(&input).map_err(ReadinessError::from)?;

    info!(
        steps = script.steps.len(),
        sessions = script.sessions.len(),
        min_delay_ms = config.min_delay_ms,
        "Replaying script"
    );
    let report = run_script(&script, &config)?;
    info!(
        actions = report.actions.len(),
        end_ms = report.summary.end_ms,
        "Replay finished"
    );

    let rendered = render_report(&report, pretty)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn read_script(path: &Path) -> Result<String, io::Error> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    fs::read_to_string(path)
}

fn render_report(report: &ReplayReport, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        let mut rendered = serde_json::to_string_pretty(report)?;
        rendered.push('\n');
        return Ok(rendered);
    }

    let mut rendered = String::new();
    for record in &report.actions {
        rendered.push_str(&serde_json::to_string(record)?);
        rendered.push('\n');
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use readiness_core::ReadinessConfig;

    const SCRIPT: &str = r#"{
        "version": 1,
        "sessions": [{ "id": 1, "location": "http://a.com", "loading": true }],
        "initial_focus": 1,
        "steps": [
            { "at_ms": 0, "event": { "type": "load_stopped", "session": 1 } },
            { "at_ms": 2500, "event": { "type": "load_stopped", "session": 1 } }
        ]
    }"#;

    #[test]
    fn renders_one_record_per_line() {
        let script = parse_script(SCRIPT).expect("script");
        let report = run_script(&script, &ReadinessConfig::default()).expect("replay");

        let rendered = render_report(&report, false).expect("render");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"at_ms":0,"action":{"type":"action_delayed","session":1}}"#,
                r#"{"at_ms":2000,"action":{"type":"request_action","context":"http://a.com"}}"#,
            ]
        );
    }

    #[test]
    fn pretty_report_includes_summary() {
        let script = parse_script(SCRIPT).expect("script");
        let report = run_script(&script, &ReadinessConfig::default()).expect("replay");

        let rendered = render_report(&report, true).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["summary"]["focused_session"], 1);
        assert_eq!(value["summary"]["action_requested"], true);
        assert_eq!(value["actions"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn reads_script_from_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("timeline.json");
        fs::write(&path, SCRIPT).expect("write script");

        let input = read_script(&path).expect("read");
        assert!(parse_script(&input).is_ok());
    }

    #[test]
    fn missing_script_is_an_io_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let err = read_script(&temp_dir.path().join("nope.json")).expect_err("missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
