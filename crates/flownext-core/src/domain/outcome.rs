//! Outcome model: what a resolution call reports back.
//!
//! This module does not assume HTTP. `FlowToNextView` is the plain-data shape
//! controllers serialize; mapping to status codes stays with them.

use serde::{Deserialize, Serialize};

use super::candidates::NextTasks;
use super::ids::TaskId;

/// Classification of an outcome, for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Found,
    Ended,
    TimedOut,
    NotYet,
}

/// Result of a blocking resolution.
///
/// - `Found`: at least one next task exists (earliest-created first).
/// - `Ended`: the instance has no active execution and no candidate tasks.
/// - `TimedOut`: the deadline passed while the instance was still alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowToNextOutcome {
    Found(NextTasks),
    Ended,
    TimedOut,
}

impl FlowToNextOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Found(_) => OutcomeKind::Found,
            Self::Ended => OutcomeKind::Ended,
            Self::TimedOut => OutcomeKind::TimedOut,
        }
    }

    /// Empty unless `Found`.
    pub fn task_ids(&self) -> &[TaskId] {
        match self {
            Self::Found(tasks) => tasks.as_slice(),
            Self::Ended | Self::TimedOut => &[],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Result of a single-shot query.
///
/// There is no timeout here: `NotYet` means "the instance is alive but nothing
/// matched on this read", and the caller decides when to ask again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeekOutcome {
    Found(NextTasks),
    Ended,
    NotYet,
}

impl PeekOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Found(_) => OutcomeKind::Found,
            Self::Ended => OutcomeKind::Ended,
            Self::NotYet => OutcomeKind::NotYet,
        }
    }

    pub fn task_ids(&self) -> &[TaskId] {
        match self {
            Self::Found(tasks) => tasks.as_slice(),
            Self::Ended | Self::NotYet => &[],
        }
    }
}

/// Response shape handed to the controller layer.
///
/// ```json
/// { "flowToNext": ["task-01H..."], "flowToEnd": false, "flowToNextTimeoutExceeded": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowToNextView {
    pub flow_to_next: Vec<String>,
    pub flow_to_end: bool,
    pub flow_to_next_timeout_exceeded: bool,
}

impl FlowToNextView {
    fn from_parts(task_ids: &[TaskId], ended: bool, timed_out: bool) -> Self {
        Self {
            flow_to_next: task_ids.iter().map(ToString::to_string).collect(),
            flow_to_end: ended,
            flow_to_next_timeout_exceeded: timed_out,
        }
    }
}

impl From<&FlowToNextOutcome> for FlowToNextView {
    fn from(outcome: &FlowToNextOutcome) -> Self {
        Self::from_parts(
            outcome.task_ids(),
            matches!(outcome, FlowToNextOutcome::Ended),
            matches!(outcome, FlowToNextOutcome::TimedOut),
        )
    }
}

impl From<&PeekOutcome> for FlowToNextView {
    fn from(outcome: &PeekOutcome) -> Self {
        Self::from_parts(
            outcome.task_ids(),
            matches!(outcome, PeekOutcome::Ended),
            false,
        )
    }
}
