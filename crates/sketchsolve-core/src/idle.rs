//! Inactivity detection.

use crate::Instant;
use crate::config::IdleConfig;
use std::time::Duration;

/// Timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Waiting for `timeout` of inactivity.
    Armed,
    /// Fired for the current inactivity period; re-arms on the next activity.
    Fired,
}

/// Armed/fired idle timer over a caller-supplied monotonic clock.
///
/// Activity is sampled at most once per `throttle`, so a steady stream of
/// pointer moves records one activity per throttle window. The timer fires
/// at most once per inactivity period.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    throttle: Duration,
    state: IdleState,
    last_activity: Instant,
}

impl IdleTimer {
    /// Create a timer armed at `now`.
    pub fn new(config: &IdleConfig, now: Instant) -> Self {
        Self {
            timeout: config.timeout(),
            throttle: config.throttle(),
            state: IdleState::Armed,
            last_activity: now,
        }
    }

    /// Record user activity.
    pub fn touch(&mut self, now: Instant) {
        let sampled = now.saturating_duration_since(self.last_activity) >= self.throttle;
        if self.state == IdleState::Fired || sampled {
            self.last_activity = now;
            self.state = IdleState::Armed;
        }
    }

    /// Returns `true` exactly once when the inactivity timeout elapses.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state == IdleState::Armed
            && now.saturating_duration_since(self.last_activity) >= self.timeout
        {
            self.state = IdleState::Fired;
            return true;
        }
        false
    }

    /// Time left before the timer fires; zero once fired.
    pub fn time_until_idle(&self, now: Instant) -> Duration {
        match self.state {
            IdleState::Armed => self
                .timeout
                .saturating_sub(now.saturating_duration_since(self.last_activity)),
            IdleState::Fired => Duration::ZERO,
        }
    }

    pub fn state(&self) -> IdleState {
        self.state
    }
}
