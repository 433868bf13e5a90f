//! Termination classifier: decides whether a poll iteration is terminal.
//!
//! Pure function over one observation. The resolver owns the I/O (queries,
//! sleeping); this module only orders the checks.

use tokio::time::Instant;

use super::budget::PollBudget;
use super::candidates::{CandidateTaskSet, NextTasks};
use super::outcome::{FlowToNextOutcome, PeekOutcome};

/// What to do after one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    Found(NextTasks),
    Ended,
    TimedOut,
    /// Sleep `budget.interval()` and query again.
    Continue,
}

impl PollDecision {
    /// `None` for `Continue`.
    pub fn into_outcome(self) -> Option<FlowToNextOutcome> {
        match self {
            Self::Found(tasks) => Some(FlowToNextOutcome::Found(tasks)),
            Self::Ended => Some(FlowToNextOutcome::Ended),
            Self::TimedOut => Some(FlowToNextOutcome::TimedOut),
            Self::Continue => None,
        }
    }

    /// Single-shot reading: a non-terminal or timed-out decision is `NotYet`.
    pub fn into_peek(self) -> PeekOutcome {
        match self {
            Self::Found(tasks) => PeekOutcome::Found(tasks),
            Self::Ended => PeekOutcome::Ended,
            Self::TimedOut | Self::Continue => PeekOutcome::NotYet,
        }
    }
}

/// Orders the checks: candidates, then liveness, then deadline.
///
/// A match observed in the same instant the instance ends or the deadline
/// passes is still `Found`; an instance that ended as the timer expired is
/// `Ended`, not `TimedOut`. `is_alive` is only called when `candidates` is
/// empty.
pub fn classify<F>(
    candidates: CandidateTaskSet,
    is_alive: F,
    now: Instant,
    budget: &PollBudget,
) -> PollDecision
where
    F: FnOnce() -> bool,
{
    if let Some(tasks) = NextTasks::from_candidates(candidates) {
        return PollDecision::Found(tasks);
    }
    if !is_alive() {
        return PollDecision::Ended;
    }
    if budget.is_exhausted_at(now) {
        return PollDecision::TimedOut;
    }
    PollDecision::Continue
}
