//! TaskMatchQuery / ProcessLiveness - 1 回の読み取り
//!
//! どちらも `ProcessEngine` ポートの薄いラッパーで、副作用はありません。
//! エラーはリトライせず、「候補なし」とも読み替えずにそのまま返します。

use tracing::debug;

use crate::domain::{AssigneeFilter, CandidateTaskSet, ProcessInstanceId};
use crate::ports::{EngineError, ProcessEngine};

/// 実行可能タスクの検索
///
/// エンジンが返した作成順を保ち、重複は最初の出現だけ残します。
pub struct TaskMatchQuery<'a> {
    engine: &'a dyn ProcessEngine,
}

impl<'a> TaskMatchQuery<'a> {
    pub fn new(engine: &'a dyn ProcessEngine) -> Self {
        Self { engine }
    }

    pub async fn query(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
    ) -> Result<CandidateTaskSet, EngineError> {
        let ids = self
            .engine
            .query_actionable_tasks(process_instance_id, filter)
            .await?;
        let candidates = CandidateTaskSet::from_ordered(ids);
        debug!(
            process_instance_id = %process_instance_id,
            filter = %filter,
            candidates = candidates.len(),
            "task match query"
        );
        Ok(candidates)
    }
}

/// プロセスインスタンスの生存確認
pub struct ProcessLiveness<'a> {
    engine: &'a dyn ProcessEngine,
}

impl<'a> ProcessLiveness<'a> {
    pub fn new(engine: &'a dyn ProcessEngine) -> Self {
        Self { engine }
    }

    pub async fn is_alive(&self, process_instance_id: ProcessInstanceId) -> Result<bool, EngineError> {
        self.engine
            .is_process_instance_active(process_instance_id)
            .await
    }
}
