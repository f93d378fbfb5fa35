//! Time sources and delayed re-checks.
//!
//! The engine never owns a timer. It hands a [`DelayedCheck`] to a
//! [`DelayedTaskScheduler`]; whoever drives the engine calls
//! `ReadinessEngine::run_delayed_check` when the delay expires. Checks are
//! never cancelled: a check that no longer applies is ignored when it runs.

use readiness_protocol::SessionId;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Wall-independent clock backed by `Instant`, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Virtual clock for replay and tests. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: u64) -> Self {
        let clock = Self::new();
        clock.set(now_ms);
        clock
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_ms.get()
    }
}

/// A pending re-evaluation for `session`, valid only while the session
/// still tracks `context` (ignoring fragments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedCheck {
    pub session: SessionId,
    pub context: String,
}

pub trait DelayedTaskScheduler {
    /// Fire-and-forget: run `check` against the engine after `delay`.
    fn schedule(&mut self, check: DelayedCheck, delay: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCheck {
    pub due_ms: u64,
    pub check: DelayedCheck,
    seq: u64,
}

/// In-memory scheduler on top of a [`ManualClock`]. Checks are released in
/// due order; ties keep scheduling order.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    clock: ManualClock,
    pending: Vec<ScheduledCheck>,
    next_seq: u64,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn pending(&self) -> &[ScheduledCheck] {
        &self.pending
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|scheduled| scheduled.due_ms).min()
    }

    /// Removes and returns the earliest check due at or before `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledCheck> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, scheduled)| scheduled.due_ms <= until_ms)
            .min_by_key(|(_, scheduled)| (scheduled.due_ms, scheduled.seq))
            .map(|(index, _)| index)?;
        Some(self.pending.remove(index))
    }
}

impl DelayedTaskScheduler for ManualScheduler {
    fn schedule(&mut self, check: DelayedCheck, delay: Duration) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let due_ms = self.clock.now_millis().saturating_add(delay_ms);
        self.pending.push(ScheduledCheck {
            due_ms,
            check,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(session: u64, context: &str) -> DelayedCheck {
        DelayedCheck {
            session: SessionId(session),
            context: context.to_string(),
        }
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_millis(), 150);
        other.set(1_000);
        assert_eq!(clock.now_millis(), 1_000);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
    }

    #[test]
    fn scheduler_releases_in_due_order() {
        let clock = ManualClock::new();
        let mut scheduler = ManualScheduler::new(clock.clone());

        scheduler.schedule(check(1, "http://a.com"), Duration::from_millis(2_000));
        clock.set(500);
        scheduler.schedule(check(2, "http://b.com"), Duration::from_millis(1_000));

        assert_eq!(scheduler.next_due_ms(), Some(1_500));
        assert!(scheduler.pop_due(1_000).is_none());

        let first = scheduler.pop_due(u64::MAX).expect("first");
        assert_eq!(first.due_ms, 1_500);
        assert_eq!(first.check.session, SessionId(2));

        let second = scheduler.pop_due(u64::MAX).expect("second");
        assert_eq!(second.due_ms, 2_000);
        assert_eq!(second.check.session, SessionId(1));
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn ties_keep_scheduling_order() {
        let clock = ManualClock::new();
        let mut scheduler = ManualScheduler::new(clock);

        scheduler.schedule(check(1, "http://a.com"), Duration::from_millis(100));
        scheduler.schedule(check(2, "http://b.com"), Duration::from_millis(100));

        assert_eq!(scheduler.pop_due(100).expect("first").check.session, SessionId(1));
        assert_eq!(scheduler.pop_due(100).expect("second").check.session, SessionId(2));
    }
}
