//! Poll budget: deadline and pacing for one resolution call.

use std::time::Duration;

use tokio::time::Instant;

/// `{ deadline, interval }`, fixed at call start and never recomputed.
///
/// `deadline` is `None` when `started_at + timeout` is not representable;
/// such a budget is never exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    deadline: Option<Instant>,
    interval: Duration,
}

impl PollBudget {
    /// `deadline = started_at + timeout`.
    ///
    /// A zero timeout still allows one full iteration; the caller evaluates
    /// the deadline only after the first query.
    pub fn starting_at(started_at: Instant, timeout: Duration, interval: Duration) -> Self {
        Self {
            deadline: started_at.checked_add(timeout),
            interval,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_exhausted_at(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Converts a caller-supplied timeout in seconds; negative values mean zero.
pub fn timeout_from_secs(timeout_secs: i64) -> Duration {
    Duration::from_secs(timeout_secs.max(0).unsigned_abs())
}
