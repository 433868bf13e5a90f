//! TaskLocalAuthContext - リクエストローカルな認可コンテキスト
//!
//! # 学習ポイント
//! - `tokio::task_local!` によるリクエスト単位の状態
//! - 同じ `TaskLocalAuthContext` を共有しても、別タスクのリクエスト同士は干渉しない
//!
//! コントローラ層はリクエストごとに `TaskLocalAuthContext::scope()` で
//! ログイン中のユーザーを載せてからリゾルバを呼び出します。

use std::cell::RefCell;
use std::future::Future;

use crate::domain::AuthSnapshot;
use crate::ports::{AuthContext, AuthContextError};

tokio::task_local! {
    static SESSION: RefCell<Option<AuthSnapshot>>;
}

/// TaskLocalAuthContext は task-local に載ったセッションを読み書きする
///
/// `scope()` の外から呼ばれた場合は `AuthContextError::Unavailable` を返します。
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalAuthContext;

impl TaskLocalAuthContext {
    /// `initial` をセッションに載せて `fut` を実行する
    pub async fn scope<F: Future>(initial: Option<AuthSnapshot>, fut: F) -> F::Output {
        SESSION.scope(RefCell::new(initial), fut).await
    }

    fn with_session<R>(
        &self,
        f: impl FnOnce(&RefCell<Option<AuthSnapshot>>) -> R,
    ) -> Result<R, AuthContextError> {
        SESSION
            .try_with(f)
            .map_err(|_| AuthContextError::Unavailable("no session in the current task".into()))
    }
}

impl AuthContext for TaskLocalAuthContext {
    fn current(&self) -> Result<Option<AuthSnapshot>, AuthContextError> {
        self.with_session(|cell| cell.borrow().clone())
    }

    fn clear(&self) -> Result<(), AuthContextError> {
        self.with_session(|cell| {
            *cell.borrow_mut() = None;
        })
    }

    fn set(&self, snapshot: Option<AuthSnapshot>) -> Result<(), AuthContextError> {
        self.with_session(|cell| {
            *cell.borrow_mut() = snapshot;
        })
    }
}
