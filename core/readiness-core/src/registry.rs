use readiness_protocol::SessionId;
use std::collections::HashMap;

use crate::state::SessionReadinessState;

/// Readiness state for every observed session. A session has an entry
/// exactly while it is observed.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    entries: HashMap<SessionId, SessionReadinessState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins observing `session`. Returns false if it was already observed,
    /// in which case the existing state is left untouched.
    pub fn start_observing(&mut self, session: SessionId, initial_location: &str) -> bool {
        if self.entries.contains_key(&session) {
            return false;
        }
        self.entries
            .insert(session, SessionReadinessState::new(initial_location));
        true
    }

    /// Stops observing `session` and drops its state. Returns false if it
    /// was not observed.
    pub fn stop_observing(&mut self, session: SessionId) -> bool {
        self.entries.remove(&session).is_some()
    }

    pub fn is_observing(&self, session: SessionId) -> bool {
        self.entries.contains_key(&session)
    }

    pub fn get(&self, session: SessionId) -> Option<&SessionReadinessState> {
        self.entries.get(&session)
    }

    pub fn get_mut(&mut self, session: SessionId) -> Option<&mut SessionReadinessState> {
        self.entries.get_mut(&session)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observed session ids in ascending order.
    pub fn sessions(&self) -> Vec<SessionId> {
        let mut sessions: Vec<SessionId> = self.entries.keys().copied().collect();
        sessions.sort();
        sessions
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
