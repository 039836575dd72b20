//! Poll cycle state machine
//!
//! ```text
//!          tick (due)
//!   Idle ─────────────► Polling ──ok──► Publishing ──┐
//!    ▲                     │                          │
//!    │                     └─err──► Failed ───────────┤
//!    └────────────────────────────────────────────────┘
//! ```
//!
//! Time is supplied by the caller, so the same machine runs under a tokio
//! interval in the daemon and under hand-stepped instants in tests. A failed
//! cycle is never retried early: the next attempt is the next due tick.

use crate::telemetry::Reading;
use crate::UpsError;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Publishing,
    Failed,
}

/// A poll cycle that could not publish
#[derive(Debug, Clone, PartialEq)]
pub struct FailureEvent {
    pub at: Instant,
    pub error: UpsError,
}

/// Result of one scheduling step
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The interval has not elapsed yet
    NotDue,
    /// Sinks received a fresh reading
    Published(Reading),
    /// The cycle was skipped; sinks keep their previous values
    Failed(FailureEvent),
    /// Queued commands ran instead of a poll
    Commands(usize),
    /// The device failed setup and is not polled
    Halted,
}

/// Tracks when the next poll is due and which stage a cycle is in
#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: Duration,
    next_due: Option<Instant>,
    state: PollState,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            state: PollState::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// When the next poll will run, `None` before the first one
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// The first tick is always due
    pub fn is_due(&self, now: Instant) -> bool {
        self.state == PollState::Idle && self.next_due.is_none_or(|due| now >= due)
    }

    /// Enter `Polling` and book the following tick
    pub fn begin(&mut self, now: Instant) {
        debug_assert_eq!(self.state, PollState::Idle);
        self.state = PollState::Polling;
        self.next_due = Some(now + self.interval);
    }

    pub fn succeed(&mut self) {
        debug_assert_eq!(self.state, PollState::Polling);
        self.state = PollState::Publishing;
    }

    pub fn fail(&mut self) {
        debug_assert_eq!(self.state, PollState::Polling);
        self.state = PollState::Failed;
    }

    /// Close the cycle from `Publishing` or `Failed`
    pub fn finish(&mut self) {
        debug_assert!(matches!(
            self.state,
            PollState::Publishing | PollState::Failed
        ));
        self.state = PollState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let scheduler = PollScheduler::new(Duration::from_secs(60));
        assert_eq!(scheduler.state(), PollState::Idle);
        assert_eq!(scheduler.next_due(), None);
        assert!(scheduler.is_due(Instant::now()));
    }

    #[test]
    fn test_successful_cycle() {
        let start = Instant::now();
        let mut scheduler = PollScheduler::new(Duration::from_secs(60));

        scheduler.begin(start);
        assert_eq!(scheduler.state(), PollState::Polling);
        assert!(!scheduler.is_due(start));

        scheduler.succeed();
        assert_eq!(scheduler.state(), PollState::Publishing);

        scheduler.finish();
        assert_eq!(scheduler.state(), PollState::Idle);
        assert_eq!(scheduler.next_due(), Some(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_failed_cycle_waits_full_interval() {
        let start = Instant::now();
        let mut scheduler = PollScheduler::new(Duration::from_secs(60));

        scheduler.begin(start);
        scheduler.fail();
        assert_eq!(scheduler.state(), PollState::Failed);
        scheduler.finish();

        assert!(!scheduler.is_due(start + Duration::from_secs(1)));
        assert!(!scheduler.is_due(start + Duration::from_secs(59)));
        assert!(scheduler.is_due(start + Duration::from_secs(60)));
    }
}
