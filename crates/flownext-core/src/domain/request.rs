use serde::{Deserialize, Serialize};

use super::identity::UserId;

/// Per-request overrides sent by the controller layer.
///
/// Every field is optional; missing values fall back to `ResolverConfig`.
/// A negative `timeout_secs` is treated as zero (one query, no waiting).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowToNextRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_assignee: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserId>,
}

impl FlowToNextRequest {
    pub fn with_timeout_secs(mut self, secs: i64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn ignoring_assignee(mut self, ignore: bool) -> Self {
        self.ignore_assignee = Some(ignore);
        self
    }

    pub fn for_assignee(mut self, user: UserId) -> Self {
        self.assignee = Some(user);
        self
    }
}
