//! Candidate sets observed by one poll iteration.

use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// The ordered task ids matching the filter, as seen by a single query.
///
/// Transient: built fresh every iteration and never cached. Order is the
/// engine's creation order; duplicates are dropped keeping the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTaskSet {
    task_ids: Vec<TaskId>,
}

impl CandidateTaskSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ordered(ids: impl IntoIterator<Item = TaskId>) -> Self {
        let mut task_ids: Vec<TaskId> = Vec::new();
        for id in ids {
            if !task_ids.contains(&id) {
                task_ids.push(id);
            }
        }
        Self { task_ids }
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
    }
}

/// A non-empty, ordered list of next task ids.
///
/// Only constructible from a non-empty candidate set, so a `Found` outcome can
/// never carry an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaskId>", into = "Vec<TaskId>")]
pub struct NextTasks(Vec<TaskId>);

impl NextTasks {
    /// `None` when the candidate set is empty.
    pub fn from_candidates(candidates: CandidateTaskSet) -> Option<Self> {
        if candidates.is_empty() {
            None
        } else {
            Some(Self(candidates.task_ids))
        }
    }

    pub fn as_slice(&self) -> &[TaskId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl TryFrom<Vec<TaskId>> for NextTasks {
    type Error = &'static str;

    fn try_from(ids: Vec<TaskId>) -> Result<Self, Self::Error> {
        Self::from_candidates(CandidateTaskSet::from_ordered(ids))
            .ok_or("next task list must not be empty")
    }
}

impl From<NextTasks> for Vec<TaskId> {
    fn from(tasks: NextTasks) -> Self {
        tasks.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn duplicates_are_dropped_keeping_order() {
        let a = TaskId::from_ulid(Ulid::new());
        let b = TaskId::from_ulid(Ulid::new());

        let set = CandidateTaskSet::from_ordered([b, a, b, a]);
        assert_eq!(set.task_ids(), &[b, a]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn next_tasks_cannot_be_empty() {
        assert!(NextTasks::from_candidates(CandidateTaskSet::empty()).is_none());
        assert!(NextTasks::try_from(Vec::new()).is_err());
    }

    #[test]
    fn next_tasks_keep_candidate_order() {
        let a = TaskId::from_ulid(Ulid::new());
        let b = TaskId::from_ulid(Ulid::new());
        let next = NextTasks::from_candidates(CandidateTaskSet::from_ordered([a, b])).unwrap();
        assert_eq!(next.as_slice(), &[a, b]);
        assert_eq!(next.len(), 2);
    }
}
