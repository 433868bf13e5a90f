//! Domain model (IDs, filters, budget, outcomes, classifier, errors).

pub mod assignee;
pub mod budget;
pub mod candidates;
pub mod decision;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod outcome;
pub mod request;
pub mod task;

pub use self::assignee::AssigneeFilter;
pub use self::budget::{PollBudget, timeout_from_secs};
pub use self::candidates::{CandidateTaskSet, NextTasks};
pub use self::decision::{PollDecision, classify};
pub use self::errors::{ErrorKind, ResolveError};
pub use self::identity::{AuthSnapshot, GroupId, UserId};
pub use self::ids::{ParseIdError, ProcessInstanceId, TaskId};
pub use self::outcome::{FlowToNextOutcome, FlowToNextView, OutcomeKind, PeekOutcome};
pub use self::request::FlowToNextRequest;
pub use self::task::{ActionableTask, CompletedTask};
