//! Per-session fetch readiness.
//!
//! A session tracks at most one context (a network location) and, once the
//! page has settled, the baseline time from which the debounce floor is
//! measured. The baseline is set once per context and cleared whenever the
//! context is replaced, including by an identical-looking navigation.

use serde::Serialize;

use crate::context::{is_network_location, locations_match_ignoring_fragment};

/// Behavioural state of a session with respect to firing its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPhase {
    /// No trackable context.
    Idle,
    /// Context tracked, waiting for a settle signal.
    Armed,
    /// Baseline set; the action fires once the debounce floor has elapsed.
    CountingDown,
    /// Action already requested for the focused session.
    Fired,
}

impl ReadinessPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessPhase::Idle => "idle",
            ReadinessPhase::Armed => "armed",
            ReadinessPhase::CountingDown => "counting_down",
            ReadinessPhase::Fired => "fired",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReadinessState {
    context: Option<String>,
    baseline_ms: Option<u64>,
}

impl SessionReadinessState {
    pub fn new(location: &str) -> Self {
        let mut state = Self::default();
        state.update_context(location);
        state
    }

    /// Replaces the tracked context and always clears the baseline.
    pub fn update_context(&mut self, location: &str) {
        self.context = if is_network_location(location) {
            Some(location.to_string())
        } else {
            None
        };
        self.baseline_ms = None;
    }

    /// Starts the debounce clock. Returns false when nothing changed: either
    /// there is no context to time, or the clock is already running.
    pub fn try_set_baseline(&mut self, now_ms: u64) -> bool {
        if !self.is_tracking_context() || self.is_baseline_set() {
            return false;
        }
        self.baseline_ms = Some(now_ms);
        true
    }

    pub fn is_tracking_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn is_baseline_set(&self) -> bool {
        self.baseline_ms.is_some()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn baseline_ms(&self) -> Option<u64> {
        self.baseline_ms
    }

    /// Fragment-insensitive comparison against the tracked context.
    pub fn context_matches(&self, candidate: &str) -> bool {
        locations_match_ignoring_fragment(candidate, self.context.as_deref().unwrap_or(""))
    }

    /// Phase derived from this state alone; `Fired` is decided by the engine.
    pub fn phase(&self) -> ReadinessPhase {
        match (self.is_tracking_context(), self.is_baseline_set()) {
            (false, _) => ReadinessPhase::Idle,
            (true, false) => ReadinessPhase::Armed,
            (true, true) => ReadinessPhase::CountingDown,
        }
    }
}
