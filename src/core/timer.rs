// src/core/timer.rs

use chrono::{DateTime, Duration, Utc};

/// Lifecycle of a timed assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    NotStarted,
    Running,
    Expired,
}

/// Wall-clock countdown for an assessment time limit.
///
/// Remaining time is always recomputed from the start instant and the
/// current clock, never decremented, so a suspended process or a late
/// tick cannot drift the deadline. A limit of zero minutes means untimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: DateTime<Utc>,
    limit_minutes: i64,
}

impl Countdown {
    pub fn new(started_at: DateTime<Utc>, limit_minutes: i64) -> Self {
        Self {
            started_at,
            limit_minutes,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.limit_minutes > 0
    }

    /// None for untimed countdowns, and for limits so large the deadline
    /// is not representable; those never expire.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        if !self.is_timed() {
            return None;
        }
        Duration::try_minutes(self.limit_minutes)
            .and_then(|limit| self.started_at.checked_add_signed(limit))
    }

    pub fn state(&self, now: DateTime<Utc>) -> CountdownState {
        if now < self.started_at {
            return CountdownState::NotStarted;
        }
        match self.deadline() {
            Some(deadline) if now >= deadline => CountdownState::Expired,
            _ => CountdownState::Running,
        }
    }

    /// Seconds remaining, clamped at zero. None for untimed assessments.
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline()
            .map(|deadline| (deadline - now).num_seconds().max(0))
    }
}
