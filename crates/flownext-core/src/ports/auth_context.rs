//! AuthContext port - アンビエント認可コンテキストの抽象化
//!
//! セッションが持つ「現在のユーザー」はエンジンのクエリ結果を絞り込みます。
//! リゾルバは未クレームの候補グループタスクなども見る必要があるので、
//! クエリの間だけコンテキストを退避・クリアし、終わったら元に戻します
//! （`app::guard::with_elevated_context`）。
//!
//! # 実装
//! - **TaskLocalAuthContext**: tokio の task-local に載せたリクエストローカル実装

use crate::domain::AuthSnapshot;

/// AuthContextError は認可コンテキスト操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthContextError {
    /// 現在の実行コンテキストにセッションがない
    #[error("authorization context unavailable: {0}")]
    Unavailable(String),

    /// セッション側が変更を拒否した
    #[error("authorization context rejected update: {0}")]
    Rejected(String),
}

/// AuthContext はリクエストローカルな認可コンテキスト
///
/// スレッドローカル相当のアクセスなので同期メソッドです。
/// 中身（`AuthSnapshot`）はリゾルバにとって不透明で、保存と復元にしか使いません。
pub trait AuthContext: Send + Sync {
    fn current(&self) -> Result<Option<AuthSnapshot>, AuthContextError>;

    fn clear(&self) -> Result<(), AuthContextError>;

    fn set(&self, snapshot: Option<AuthSnapshot>) -> Result<(), AuthContextError>;
}
