//! Queries the engine makes against the session manager that owns the sessions.

use readiness_protocol::{SessionDescriptor, SessionId};
use std::collections::HashMap;

pub trait SessionHost {
    /// Session focused when the engine starts, if any.
    fn focused_session(&self) -> Option<SessionId>;

    /// Private sessions are never observed or evaluated.
    fn is_private_session(&self, session: SessionId) -> bool;

    fn is_session_loading(&self, session: SessionId) -> bool;

    fn current_location(&self, session: SessionId) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSession {
    pub location: String,
    pub private: bool,
    pub loading: bool,
}

/// Table-backed host used by the replay driver and tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptHost {
    sessions: HashMap<SessionId, HostSession>,
    focused: Option<SessionId>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: &[SessionDescriptor], focused: Option<SessionId>) -> Self {
        let mut host = Self::new();
        for descriptor in descriptors {
            host.upsert(
                descriptor.id,
                HostSession {
                    location: descriptor.location.clone(),
                    private: descriptor.private,
                    loading: descriptor.loading,
                },
            );
        }
        host.focused = focused;
        host
    }

    pub fn upsert(&mut self, session: SessionId, state: HostSession) {
        self.sessions.insert(session, state);
    }

    pub fn remove(&mut self, session: SessionId) {
        self.sessions.remove(&session);
        if self.focused == Some(session) {
            self.focused = None;
        }
    }

    pub fn set_focused(&mut self, session: Option<SessionId>) {
        self.focused = session;
    }

    pub fn set_location(&mut self, session: SessionId, location: &str) {
        self.sessions.entry(session).or_default().location = location.to_string();
    }

    pub fn set_loading(&mut self, session: SessionId, loading: bool) {
        self.sessions.entry(session).or_default().loading = loading;
    }
}

impl SessionHost for ScriptHost {
    fn focused_session(&self) -> Option<SessionId> {
        self.focused
    }

    fn is_private_session(&self, session: SessionId) -> bool {
        self.sessions
            .get(&session)
            .map(|state| state.private)
            .unwrap_or(false)
    }

    fn is_session_loading(&self, session: SessionId) -> bool {
        self.sessions
            .get(&session)
            .map(|state| state.loading)
            .unwrap_or(false)
    }

    fn current_location(&self, session: SessionId) -> String {
        self.sessions
            .get(&session)
            .map(|state| state.location.clone())
            .unwrap_or_default()
    }
}
