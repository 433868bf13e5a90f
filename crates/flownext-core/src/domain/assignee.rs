//! Assignee filter: which actionable tasks count as "next" for a request.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::{GroupId, UserId};
use super::task::ActionableTask;

/// Chosen once per resolution request.
///
/// - `Any`: every actionable task of the instance qualifies.
/// - `User(u)`: tasks assigned to `u`, or unassigned tasks `u` may claim as a
///   candidate user or through one of its groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user", rename_all = "snake_case")]
pub enum AssigneeFilter {
    Any,
    User(UserId),
}

impl AssigneeFilter {
    /// `None` means "no assignee constraint".
    pub fn for_user(user: Option<UserId>) -> Self {
        match user {
            Some(u) => Self::User(u),
            None => Self::Any,
        }
    }

    /// The controller-level "ignore assignee" flag wins over any user.
    pub fn from_request(user: Option<UserId>, ignore_assignee: bool) -> Self {
        if ignore_assignee {
            Self::Any
        } else {
            Self::for_user(user)
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        match self {
            Self::Any => None,
            Self::User(u) => Some(u),
        }
    }

    /// Whether `task` qualifies under this filter.
    ///
    /// `user_groups` are the groups the filtered user belongs to; they are
    /// ignored for `Any`. A task assigned to someone else never qualifies for
    /// `User(u)`, even if `u` is also listed as a candidate.
    pub fn admits(&self, task: &ActionableTask, user_groups: &[GroupId]) -> bool {
        let user = match self {
            Self::Any => return true,
            Self::User(u) => u,
        };

        match &task.assignee {
            Some(assignee) => assignee == user,
            None => {
                task.candidate_users.contains(user)
                    || task
                        .candidate_groups
                        .iter()
                        .any(|g| user_groups.contains(g))
            }
        }
    }
}

impl fmt::Display for AssigneeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::User(u) => write!(f, "user:{u}"),
        }
    }
}
