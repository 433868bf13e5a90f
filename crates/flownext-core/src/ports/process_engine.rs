//! ProcessEngine port - ワークフローエンジンへの読み取り専用クエリ
//!
//! リゾルバが必要とするのは 2 つの読み取りだけです：
//! - 実行可能タスクの検索（assignee フィルタ付き、作成順）
//! - プロセスインスタンスの生存確認
//!
//! # 実装
//! - **InMemoryProcessEngine**: 開発・テスト用（`impls::inmem_engine`）
//! - 本番用は実エンジンの REST / DB クエリをラップする別クレートに置く想定

use async_trait::async_trait;

use crate::domain::{AssigneeFilter, ProcessInstanceId, TaskId};

/// EngineError はエンジン呼び出しのエラー
///
/// リゾルバはこれらをリトライせずに呼び出し元へ返します。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// 一度も存在しなかったインスタンス（終了済みとは区別する）
    #[error("process instance not found: {0}")]
    ProcessInstanceNotFound(ProcessInstanceId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// ProcessEngine はエンジンのタスク・プロセス照会 API
///
/// # 契約
/// - `query_actionable_tasks`: `filter` に一致する未完了タスクの ID を作成順（古い順）で返す。
///   1 回の呼び出しは 1 回の一貫した読み取り。
/// - `is_process_instance_active`: アクティブな実行が 1 つでも残っていれば `true`。
///   終了済みのインスタンスは `Ok(false)`、未知のインスタンスは `ProcessInstanceNotFound`。
/// - どちらも副作用なし
#[async_trait]
pub trait ProcessEngine: Send + Sync {
    async fn query_actionable_tasks(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
    ) -> Result<Vec<TaskId>, EngineError>;

    async fn is_process_instance_active(
        &self,
        process_instance_id: ProcessInstanceId,
    ) -> Result<bool, EngineError>;
}
