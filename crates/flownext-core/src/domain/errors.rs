//! Errors - 解決処理のエラー型と分類
//!
//! エンジンや認可コンテキストのエラーはリトライせず、そのまま呼び出し元へ返します。
//! `TimedOut` や `Ended` に読み替えることはしません。

use crate::ports::{AuthContextError, EngineError};

/// ErrorKind はコントローラ層向けの粗い分類
///
/// - NotFound: 存在しないプロセスインスタンス・タスク（404 相当）
/// - Infrastructure: エンジン障害・クエリ失敗
/// - Authorization: 認可コンテキストの保存・復元に失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Infrastructure,
    Authorization,
}

/// ResolveError は resolve / peek のエラー
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("engine query failed: {0}")]
    Engine(#[from] EngineError),

    #[error("authorization context failed: {0}")]
    AuthContext(#[from] AuthContextError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Engine(EngineError::ProcessInstanceNotFound(_))
            | Self::Engine(EngineError::TaskNotFound(_)) => ErrorKind::NotFound,
            Self::Engine(_) => ErrorKind::Infrastructure,
            Self::AuthContext(_) => ErrorKind::Authorization,
        }
    }
}
