//! Task snapshots exchanged with the engine port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{GroupId, UserId};
use super::ids::{ProcessInstanceId, TaskId};

/// An open user task as the engine reports it.
///
/// `created_seq` is the engine's monotonic creation counter and defines
/// creation order; `created_at` is informational wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionableTask {
    pub id: TaskId,
    pub process_instance_id: ProcessInstanceId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_seq: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidate_users: Vec<UserId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidate_groups: Vec<GroupId>,
}

impl ActionableTask {
    /// Creation order key: earliest first.
    pub fn creation_key(&self) -> u64 {
        self.created_seq
    }
}

/// The task a user has just completed.
///
/// This is what the task-based entry point of the resolver receives; the
/// process instance and default assignee filter are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task_id: TaskId,
    pub process_instance_id: ProcessInstanceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserId>,
}
