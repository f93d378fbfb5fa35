//! The downstream side of the engine.

use readiness_protocol::{Action, ActionRecord, SessionId};

use crate::timing::{Clock, ManualClock};

/// Receives the engine's decisions. Implementations perform the actual
/// fetch and UI signalling; the engine only says when.
pub trait ActionSink {
    /// Fire the downstream action for `context`.
    fn request_action(&mut self, context: &str);

    /// Forget any previous request; the page context is gone.
    fn clear_state(&mut self);

    /// A debounce wait has begun or been extended for `session`.
    fn report_action_delayed(&mut self, session: SessionId);
}

/// Sink that records every call with the virtual time it happened at.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    clock: ManualClock,
    records: Vec<ActionRecord>,
}

impl RecordingSink {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn take_records(&mut self) -> Vec<ActionRecord> {
        std::mem::take(&mut self.records)
    }

    /// Contexts passed to `request_action`, in order.
    pub fn requested_contexts(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|record| match &record.action {
                Action::RequestAction { context } => Some(context.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.action == Action::ClearState)
            .count()
    }

    pub fn delayed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record.action, Action::ActionDelayed { .. }))
            .count()
    }

    fn push(&mut self, action: Action) {
        self.records.push(ActionRecord {
            at_ms: self.clock.now_millis(),
            action,
        });
    }
}

impl ActionSink for RecordingSink {
    fn request_action(&mut self, context: &str) {
        self.push(Action::RequestAction {
            context: context.to_string(),
        });
    }

    fn clear_state(&mut self) {
        self.push(Action::ClearState);
    }

    fn report_action_delayed(&mut self, session: SessionId) {
        self.push(Action::ActionDelayed { session });
    }
}
