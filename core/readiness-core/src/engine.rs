//! ReadinessEngine - decides when the focused session may fire its action.
//!
//! The engine consumes session lifecycle and page events, keeps one
//! [`SessionReadinessState`](crate::state::SessionReadinessState) per
//! observed session, and asks the [`ActionSink`] to act at most once per page
//! context of the focused session, no earlier than the configured debounce
//! floor after the page settled.
//!
//! ## Model
//!
//! - **Single-threaded**: every call takes `&mut self`; delayed checks are run
//!   by the owner on the same thread, serialized with all other events.
//! - **No cancellation**: a delayed check re-validates when it runs and is a
//!   no-op if focus, observation, the fired flag or the context has moved on.
//! - **Total**: nothing here returns an error. Events that do not apply are
//!   dropped with a debug log.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use readiness_core::{
//!     ManualClock, ManualScheduler, ReadinessConfig, ReadinessEngine, RecordingSink, ScriptHost,
//! };
//! use readiness_protocol::SessionId;
//!
//! let clock = ManualClock::new();
//! let host = ScriptHost::new();
//! let mut engine = ReadinessEngine::new(
//!     ReadinessConfig::default(),
//!     RecordingSink::new(clock.clone()),
//!     ManualScheduler::new(clock.clone()),
//!     clock,
//!     &host,
//! );
//! engine.session_focused(&host, SessionId(1));
//! ```

use readiness_protocol::{LifecycleEvent, PageEvent, SessionId, SettleSignal};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ReadinessConfig;
use crate::host::SessionHost;
use crate::registry::SessionRegistry;
use crate::sink::ActionSink;
use crate::state::ReadinessPhase;
use crate::timing::{Clock, DelayedCheck, DelayedTaskScheduler};

pub struct ReadinessEngine<K, D, C> {
    config: ReadinessConfig,
    sink: K,
    scheduler: D,
    clock: C,
    registry: SessionRegistry,
    focused: Option<SessionId>,
    action_requested: bool,
}

impl<K, D, C> ReadinessEngine<K, D, C>
where
    K: ActionSink,
    D: DelayedTaskScheduler,
    C: Clock,
{
    /// Creates the engine and adopts whatever session the host reports as
    /// focused. If that session has already finished loading, its debounce
    /// clock starts now.
    pub fn new(
        config: ReadinessConfig,
        sink: K,
        scheduler: D,
        clock: C,
        host: &dyn SessionHost,
    ) -> Self {
        let mut engine = Self {
            config,
            sink,
            scheduler,
            clock,
            registry: SessionRegistry::new(),
            focused: None,
            action_requested: false,
        };

        if let Some(session) = host.focused_session() {
            engine.session_focused(host, session);
            if let Some(focused) = engine.focused {
                if engine.maybe_set_baseline(host, focused) {
                    engine.maybe_start_fetch(focused);
                }
            }
        }

        engine
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event entry points
    // ─────────────────────────────────────────────────────────────────────────

    pub fn handle_lifecycle(&mut self, host: &dyn SessionHost, event: LifecycleEvent) {
        debug!(session = %event.session(), ?event, "Lifecycle event");
        match event {
            LifecycleEvent::Created(session) => self.session_created(host, session),
            LifecycleEvent::Focused(session) => self.session_focused(host, session),
            LifecycleEvent::Removed(session) => self.session_removed(session),
        }
    }

    pub fn handle_page_event(&mut self, session: SessionId, event: PageEvent) {
        match event {
            PageEvent::ContextChanged { location } => {
                self.navigation_context_changed(session, &location)
            }
            PageEvent::Settled { signal } => self.settle(session, signal),
        }
    }

    /// A new session appeared. Sessions that are already loaded start their
    /// debounce clock immediately.
    pub fn session_created(&mut self, host: &dyn SessionHost, session: SessionId) {
        self.start_observing(host, session);
        if self.maybe_set_baseline(host, session) {
            self.maybe_start_fetch(session);
        }
    }

    /// Focus moved to `session`. This is the only place `focused` changes to
    /// a session, so the clear-before-evaluate ordering lives here.
    pub fn session_focused(&mut self, host: &dyn SessionHost, session: SessionId) {
        if let Some(previous) = self.focused {
            if previous != session {
                debug!(from = %previous, to = %session, "Focus changed; clearing state");
                self.clear_state();
            }
        }

        if host.is_private_session(session) {
            debug!(session = %session, "Private session focused; nothing to track");
            self.focused = None;
            return;
        }

        self.start_observing(host, session);
        self.focused = Some(session);
        self.maybe_start_fetch(session);
    }

    pub fn session_removed(&mut self, session: SessionId) {
        self.stop_observing(session);
        if self.focused == Some(session) {
            self.clear_state();
            self.focused = None;
        }
    }

    /// The session navigated. For the focused session any earlier request
    /// is abandoned first; the session's own context and baseline are reset
    /// regardless.
    pub fn navigation_context_changed(&mut self, session: SessionId, location: &str) {
        if !self.registry.is_observing(session) {
            debug!(session = %session, "Navigation for unobserved session ignored");
            return;
        }

        if self.focused == Some(session) {
            self.clear_state();
        }

        if let Some(state) = self.registry.get_mut(session) {
            state.update_context(location);
            debug!(
                session = %session,
                phase = state.phase().as_str(),
                "Session context updated"
            );
        }
    }

    pub fn first_content_painted(&mut self, session: SessionId) {
        self.settle(session, SettleSignal::FirstContentfulPaint);
    }

    pub fn page_load_finished(&mut self, session: SessionId) {
        self.settle(session, SettleSignal::PageLoadFinished);
    }

    pub fn load_stopped(&mut self, session: SessionId) {
        self.settle(session, SettleSignal::LoadStopped);
    }

    /// Runs a check previously handed to the scheduler. Returns true if it
    /// fired the action.
    pub fn run_delayed_check(&mut self, check: DelayedCheck) -> bool {
        let DelayedCheck { session, context } = check;

        if self.focused != Some(session) {
            debug!(session = %session, "Delayed check stale: session not focused");
            return false;
        }
        if self.action_requested {
            debug!(session = %session, "Delayed check stale: action already requested");
            return false;
        }
        let Some(state) = self.registry.get(session) else {
            debug!(session = %session, "Delayed check stale: session not observed");
            return false;
        };
        if !state.context_matches(&context) {
            debug!(session = %session, "Delayed check stale: context changed");
            return false;
        }

        self.request_action(session, context);
        true
    }

    /// Drops all per-session state and focus. Checks still in flight become
    /// stale. The sink is not notified.
    pub fn shutdown(&mut self) {
        debug!(observed = self.registry.len(), "Readiness engine shutting down");
        self.registry.clear();
        self.focused = None;
        self.action_requested = false;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn focused_session(&self) -> Option<SessionId> {
        self.focused
    }

    pub fn action_requested(&self) -> bool {
        self.action_requested
    }

    pub fn is_observing(&self, session: SessionId) -> bool {
        self.registry.is_observing(session)
    }

    /// Phase of an observed session, `None` if it is not observed.
    pub fn phase(&self, session: SessionId) -> Option<ReadinessPhase> {
        let state = self.registry.get(session)?;
        if self.focused == Some(session) && self.action_requested {
            return Some(ReadinessPhase::Fired);
        }
        Some(state.phase())
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn scheduler(&self) -> &D {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut D {
        &mut self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn settle(&mut self, session: SessionId, signal: SettleSignal) {
        let now = self.clock.now_millis();
        let Some(state) = self.registry.get_mut(session) else {
            debug!(
                session = %session,
                signal = signal.as_str(),
                "Settle signal for unobserved session ignored"
            );
            return;
        };

        if state.try_set_baseline(now) {
            debug!(
                session = %session,
                signal = signal.as_str(),
                phase = state.phase().as_str(),
                baseline_ms = now,
                "Debounce baseline set"
            );
            self.maybe_start_fetch(session);
        }
    }

    fn maybe_set_baseline(&mut self, host: &dyn SessionHost, session: SessionId) -> bool {
        if host.is_session_loading(session) {
            return false;
        }
        let now = self.clock.now_millis();
        self.registry
            .get_mut(session)
            .map(|state| state.try_set_baseline(now))
            .unwrap_or(false)
    }

    fn maybe_start_fetch(&mut self, session: SessionId) {
        if self.focused != Some(session) {
            return;
        }

        // One request per clear-state epoch.
        if self.action_requested {
            return;
        }

        let Some(state) = self.registry.get(session) else {
            return;
        };
        let (Some(context), Some(baseline_ms)) = (state.context(), state.baseline_ms()) else {
            return;
        };
        let context = context.to_string();

        let elapsed_ms = self.clock.now_millis().saturating_sub(baseline_ms);
        let min_delay_ms = self.config.min_delay_ms;
        if elapsed_ms < min_delay_ms {
            let delay_ms = min_delay_ms - elapsed_ms;
            debug!(session = %session, delay_ms, "Action delayed until debounce floor");
            self.sink.report_action_delayed(session);
            self.scheduler
                .schedule(DelayedCheck { session, context }, Duration::from_millis(delay_ms));
            return;
        }

        self.request_action(session, context);
    }

    fn request_action(&mut self, session: SessionId, context: String) {
        info!(session = %session, context = %context, "Requesting action");
        self.action_requested = true;
        self.sink.request_action(&context);
    }

    fn clear_state(&mut self) {
        self.sink.clear_state();
        self.action_requested = false;
    }

    fn start_observing(&mut self, host: &dyn SessionHost, session: SessionId) -> bool {
        if host.is_private_session(session) {
            return false;
        }
        let started = self
            .registry
            .start_observing(session, &host.current_location(session));
        if started {
            debug!(session = %session, "Observing session");
        }
        started
    }

    fn stop_observing(&mut self, session: SessionId) -> bool {
        let stopped = self.registry.stop_observing(session);
        if stopped {
            debug!(session = %session, "Stopped observing session");
        }
        stopped
    }
}
