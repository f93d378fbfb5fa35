//! Virtual-time replay of a scripted session timeline.
//!
//! Before each step, every delayed check due at or before the step's time
//! runs in due order with the clock moved to its due time. After the last
//! step, remaining checks are drained the same way.

use readiness_protocol::{ActionRecord, ReplayScript, ScriptEvent, SessionId};
use serde::Serialize;
use tracing::debug;

use crate::config::ReadinessConfig;
use crate::engine::ReadinessEngine;
use crate::error::Result;
use crate::host::{HostSession, ScriptHost};
use crate::sink::RecordingSink;
use crate::timing::{Clock, ManualClock, ManualScheduler};

type ReplayEngine = ReadinessEngine<RecordingSink, ManualScheduler, ManualClock>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub focused_session: Option<SessionId>,
    pub observed_sessions: usize,
    pub action_requested: bool,
    pub end_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub actions: Vec<ActionRecord>,
    pub summary: ReplaySummary,
}

pub fn run_script(script: &ReplayScript, config: &ReadinessConfig) -> Result<ReplayReport> {
    script.validate()?;

    let clock = ManualClock::new();
    let mut host = ScriptHost::from_descriptors(&script.sessions, script.initial_focus);
    let mut engine = ReadinessEngine::new(
        config.clone(),
        RecordingSink::new(clock.clone()),
        ManualScheduler::new(clock.clone()),
        clock.clone(),
        &host,
    );

    for step in &script.steps {
        run_due_checks(&mut engine, &clock, step.at_ms);
        clock.set(step.at_ms);
        apply_event(&mut engine, &mut host, &step.event);
    }
    run_due_checks(&mut engine, &clock, u64::MAX);

    let summary = ReplaySummary {
        focused_session: engine.focused_session(),
        observed_sessions: engine.registry().len(),
        action_requested: engine.action_requested(),
        end_ms: clock.now_millis(),
    };
    Ok(ReplayReport {
        actions: engine.sink_mut().take_records(),
        summary,
    })
}

fn run_due_checks(engine: &mut ReplayEngine, clock: &ManualClock, until_ms: u64) {
    while let Some(scheduled) = engine.scheduler_mut().pop_due(until_ms) {
        clock.set(scheduled.due_ms.max(clock.now_millis()));
        let session = scheduled.check.session;
        let fired = engine.run_delayed_check(scheduled.check);
        debug!(session = %session, at_ms = clock.now_millis(), fired, "Delayed check ran");
    }
}

fn apply_event(engine: &mut ReplayEngine, host: &mut ScriptHost, event: &ScriptEvent) {
    match event {
        ScriptEvent::SessionCreated {
            session,
            location,
            private,
            loading,
        } => {
            host.upsert(
                *session,
                HostSession {
                    location: location.clone(),
                    private: *private,
                    loading: *loading,
                },
            );
            engine.session_created(&*host, *session);
        }
        ScriptEvent::SessionFocused { session } => {
            host.set_focused(Some(*session));
            engine.session_focused(&*host, *session);
        }
        ScriptEvent::SessionRemoved { session } => {
            engine.session_removed(*session);
            host.remove(*session);
        }
        ScriptEvent::ContextChanged { session, location } => {
            host.set_location(*session, location);
            engine.navigation_context_changed(*session, location);
        }
        ScriptEvent::FirstContentPainted { session } => engine.first_content_painted(*session),
        ScriptEvent::PageLoadFinished { session } => engine.page_load_finished(*session),
        ScriptEvent::LoadStopped { session } => engine.load_stopped(*session),
        ScriptEvent::SetLoading { session, loading } => host.set_loading(*session, *loading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readiness_protocol::{parse_script, Action};

    #[test]
    fn drains_checks_after_last_step() {
        let script = parse_script(
            r#"{
                "version": 1,
                "sessions": [{ "id": 1, "location": "http://a.com", "loading": true }],
                "initial_focus": 1,
                "steps": [
                    { "at_ms": 0, "event": { "type": "load_stopped", "session": 1 } }
                ]
            }"#,
        )
        .expect("script");

        let report = run_script(&script, &ReadinessConfig::default()).expect("replay");
        assert_eq!(
            report.actions,
            vec![
                ActionRecord {
                    at_ms: 0,
                    action: Action::ActionDelayed {
                        session: SessionId(1)
                    },
                },
                ActionRecord {
                    at_ms: 2_000,
                    action: Action::RequestAction {
                        context: "http://a.com".to_string()
                    },
                },
            ]
        );
        assert_eq!(report.summary.end_ms, 2_000);
        assert!(report.summary.action_requested);
        assert_eq!(report.summary.focused_session, Some(SessionId(1)));
    }

    #[test]
    fn set_loading_changes_created_session_behaviour() {
        let script = parse_script(
            r#"{
                "version": 1,
                "steps": [
                    { "at_ms": 0, "event": { "type": "session_created", "session": 3, "location": "https://c.com", "loading": true } },
                    { "at_ms": 0, "event": { "type": "session_focused", "session": 3 } },
                    { "at_ms": 100, "event": { "type": "set_loading", "session": 3, "loading": false } },
                    { "at_ms": 100, "event": { "type": "page_load_finished", "session": 3 } }
                ]
            }"#,
        )
        .expect("script");

        let report = run_script(&script, &ReadinessConfig::with_min_delay_ms(1_000))
            .expect("replay");
        let fired: Vec<&ActionRecord> = report
            .actions
            .iter()
            .filter(|record| matches!(record.action, Action::RequestAction { .. }))
            .collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at_ms, 1_100);
    }

    #[test]
    fn invalid_script_is_rejected() {
        let script = ReplayScript {
            version: 2,
            sessions: Vec::new(),
            initial_focus: None,
            steps: Vec::new(),
        };
        assert!(run_script(&script, &ReadinessConfig::default()).is_err());
    }
}
