//! Event, action and replay-script types for the fetch-readiness engine.
//!
//! This crate is shared by the engine and its clients to prevent schema drift.
//! The engine consumes the in-process event enums directly; the replay CLI
//! reads scripts in the JSON form defined here and writes `ActionRecord`s.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const SCRIPT_VERSION: u32 = 1;
pub const MAX_SCRIPT_BYTES: usize = 1024 * 1024; // 1MB

/// Opaque handle for a tracked session, assigned by the external session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(value: u64) -> Self {
        SessionId(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-process events
// ─────────────────────────────────────────────────────────────────────────────

/// Signals that the page in a session has "settled" enough to start the
/// debounce clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleSignal {
    FirstContentfulPaint,
    PageLoadFinished,
    LoadStopped,
}

impl SettleSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettleSignal::FirstContentfulPaint => "first_contentful_paint",
            SettleSignal::PageLoadFinished => "page_load_finished",
            SettleSignal::LoadStopped => "load_stopped",
        }
    }
}

/// Per-session navigation and paint events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    ContextChanged { location: String },
    Settled { signal: SettleSignal },
}

/// Session lifecycle events from the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "session", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Created(SessionId),
    Focused(SessionId),
    Removed(SessionId),
}

impl LifecycleEvent {
    pub fn session(&self) -> SessionId {
        match self {
            LifecycleEvent::Created(session)
            | LifecycleEvent::Focused(session)
            | LifecycleEvent::Removed(session) => *session,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action log
// ─────────────────────────────────────────────────────────────────────────────

/// What the engine asked its action sink to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    RequestAction { context: String },
    ClearState,
    ActionDelayed { session: SessionId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub at_ms: u64,
    pub action: Action,
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay scripts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionDescriptor {
    pub id: SessionId,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptEvent {
    SessionCreated {
        session: SessionId,
        #[serde(default)]
        location: String,
        #[serde(default)]
        private: bool,
        #[serde(default)]
        loading: bool,
    },
    SessionFocused {
        session: SessionId,
    },
    SessionRemoved {
        session: SessionId,
    },
    ContextChanged {
        session: SessionId,
        location: String,
    },
    FirstContentPainted {
        session: SessionId,
    },
    PageLoadFinished {
        session: SessionId,
    },
    LoadStopped {
        session: SessionId,
    },
    /// Host-side change: what `is_session_loading` reports from now on.
    SetLoading {
        session: SessionId,
        loading: bool,
    },
}

impl ScriptEvent {
    pub fn session(&self) -> SessionId {
        match self {
            ScriptEvent::SessionCreated { session, .. }
            | ScriptEvent::SessionFocused { session }
            | ScriptEvent::SessionRemoved { session }
            | ScriptEvent::ContextChanged { session, .. }
            | ScriptEvent::FirstContentPainted { session }
            | ScriptEvent::PageLoadFinished { session }
            | ScriptEvent::LoadStopped { session }
            | ScriptEvent::SetLoading { session, .. } => *session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    pub at_ms: u64,
    pub event: ScriptEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub version: u32,
    #[serde(default)]
    pub sessions: Vec<SessionDescriptor>,
    #[serde(default)]
    pub initial_focus: Option<SessionId>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ReplayScript {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.version != SCRIPT_VERSION {
            return Err(ErrorInfo::new(
                "unsupported_version",
                format!(
                    "script version {} is not supported (expected {})",
                    self.version, SCRIPT_VERSION
                ),
            ));
        }

        let mut known: HashSet<SessionId> = HashSet::new();
        for descriptor in &self.sessions {
            if !known.insert(descriptor.id) {
                return Err(ErrorInfo::new(
                    "duplicate_session",
                    format!("session {} is declared more than once", descriptor.id),
                ));
            }
        }

        if let Some(focus) = self.initial_focus {
            if !known.contains(&focus) {
                return Err(ErrorInfo::new(
                    "unknown_session",
                    format!("initial_focus references undeclared session {}", focus),
                ));
            }
        }

        let mut last_at = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at_ms < last_at {
                return Err(ErrorInfo::new(
                    "out_of_order",
                    format!(
                        "step {} at {}ms precedes the previous step at {}ms",
                        index, step.at_ms, last_at
                    ),
                ));
            }
            last_at = step.at_ms;

            let session = step.event.session();
            if let ScriptEvent::SessionCreated { .. } = step.event {
                known.insert(session);
            } else if !known.contains(&session) {
                return Err(ErrorInfo::new(
                    "unknown_session",
                    format!("step {} references undeclared session {}", index, session),
                ));
            }
        }

        Ok(())
    }
}

pub fn parse_script(input: &str) -> Result<ReplayScript, ErrorInfo> {
    if input.len() > MAX_SCRIPT_BYTES {
        return Err(ErrorInfo::new(
            "script_too_large",
            format!("script exceeds {} bytes", MAX_SCRIPT_BYTES),
        ));
    }

    let script: ReplayScript = serde_json::from_str(input).map_err(|err| {
        ErrorInfo::new(
            "invalid_script",
            format!("script is not valid JSON: {}", err),
        )
    })?;
    script.validate()?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn script_json(steps: serde_json::Value) -> String {
        json!({
            "version": SCRIPT_VERSION,
            "sessions": [
                { "id": 1, "location": "http://a.com" },
                { "id": 2, "location": "http://b.com", "loading": true }
            ],
            "initial_focus": 1,
            "steps": steps,
        })
        .to_string()
    }

    #[test]
    fn parses_valid_script() {
        let input = script_json(json!([
            { "at_ms": 0, "event": { "type": "load_stopped", "session": 1 } },
            { "at_ms": 500, "event": { "type": "context_changed", "session": 1, "location": "http://b.com" } },
            { "at_ms": 500, "event": { "type": "session_focused", "session": 2 } }
        ]));

        let script = parse_script(&input).expect("valid script");
        assert_eq!(script.sessions.len(), 2);
        assert!(script.sessions[1].loading);
        assert!(!script.sessions[1].private);
        assert_eq!(script.initial_focus, Some(SessionId(1)));
        assert_eq!(
            script.steps[1].event,
            ScriptEvent::ContextChanged {
                session: SessionId(1),
                location: "http://b.com".to_string(),
            }
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = script_json(json!([
            { "at_ms": 0, "event": { "type": "load_stopped", "session": 1, "extra": true } }
        ]));

        let err = parse_script(&input).expect_err("unknown field");
        assert_eq!(err.code, "invalid_script");
    }

    #[test]
    fn rejects_unknown_event_type() {
        let input = script_json(json!([
            { "at_ms": 0, "event": { "type": "tab_closed", "session": 1 } }
        ]));

        let err = parse_script(&input).expect_err("unknown event");
        assert_eq!(err.code, "invalid_script");
    }

    #[test]
    fn rejects_out_of_order_steps() {
        let input = script_json(json!([
            { "at_ms": 100, "event": { "type": "load_stopped", "session": 1 } },
            { "at_ms": 50, "event": { "type": "load_stopped", "session": 1 } }
        ]));

        let err = parse_script(&input).expect_err("out of order");
        assert_eq!(err.code, "out_of_order");
    }

    #[test]
    fn rejects_undeclared_session() {
        let input = script_json(json!([
            { "at_ms": 0, "event": { "type": "session_focused", "session": 9 } }
        ]));

        let err = parse_script(&input).expect_err("undeclared session");
        assert_eq!(err.code, "unknown_session");
    }

    #[test]
    fn session_created_introduces_session() {
        let input = script_json(json!([
            { "at_ms": 0, "event": { "type": "session_created", "session": 9, "location": "https://c.com" } },
            { "at_ms": 10, "event": { "type": "session_focused", "session": 9 } }
        ]));

        let script = parse_script(&input).expect("created session is known");
        assert_eq!(script.steps[1].event.session(), SessionId(9));
    }

    #[test]
    fn rejects_wrong_version() {
        let input = json!({ "version": 7, "steps": [] }).to_string();
        let err = parse_script(&input).expect_err("version");
        assert_eq!(err.code, "unsupported_version");
    }

    #[test]
    fn rejects_duplicate_sessions() {
        let input = json!({
            "version": SCRIPT_VERSION,
            "sessions": [{ "id": 1 }, { "id": 1 }],
            "steps": []
        })
        .to_string();
        let err = parse_script(&input).expect_err("duplicate");
        assert_eq!(err.code, "duplicate_session");
    }

    #[test]
    fn rejects_undeclared_initial_focus() {
        let input = json!({ "version": SCRIPT_VERSION, "initial_focus": 4, "steps": [] }).to_string();
        let err = parse_script(&input).expect_err("initial focus");
        assert_eq!(err.code, "unknown_session");
    }

    #[test]
    fn action_record_wire_shape() {
        let record = ActionRecord {
            at_ms: 2000,
            action: Action::RequestAction {
                context: "http://a.com".to_string(),
            },
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({ "at_ms": 2000, "action": { "type": "request_action", "context": "http://a.com" } })
        );

        let delayed = serde_json::to_value(Action::ActionDelayed {
            session: SessionId(3),
        })
        .expect("serialize");
        assert_eq!(delayed, json!({ "type": "action_delayed", "session": 3 }));
    }

    #[test]
    fn lifecycle_event_wire_shape() {
        let event: LifecycleEvent =
            serde_json::from_value(json!({ "type": "removed", "session": 7 })).expect("parse");
        assert_eq!(event, LifecycleEvent::Removed(SessionId(7)));
        assert_eq!(event.session(), SessionId(7));
        assert_eq!(LifecycleEvent::Focused(SessionId(2)).session(), SessionId(2));
    }
}
