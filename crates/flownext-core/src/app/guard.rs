//! ElevatedContext - 認可コンテキストを退避してクエリを実行するスコープ
//!
//! # フロー
//! 1. `AuthContext::current()` で現在のコンテキストを退避
//! 2. `AuthContext::clear()` でクリア（エンジンが呼び出しユーザーの可視範囲で絞り込まない）
//! 3. 操作を実行
//! 4. 退避したコンテキストを `AuthContext::set()` で復元
//!
//! 4 は正常終了・エラー・panic・Future の drop（キャンセル）のすべてで実行されます。
//! 正常経路では復元エラーを返し、panic / drop 経路では warn ログに残します。

use std::future::Future;

use tracing::warn;

use crate::domain::AuthSnapshot;
use crate::ports::{AuthContext, AuthContextError};

/// 復元を保証するガード
///
/// `restore()` が呼ばれずに drop された場合（panic やキャンセル）だけ drop 側で復元します。
struct RestoreOnDrop<'a, A: AuthContext + ?Sized> {
    auth: &'a A,
    saved: Option<Option<AuthSnapshot>>,
}

impl<'a, A: AuthContext + ?Sized> RestoreOnDrop<'a, A> {
    fn new(auth: &'a A, saved: Option<AuthSnapshot>) -> Self {
        Self {
            auth,
            saved: Some(saved),
        }
    }

    fn restore(&mut self) -> Result<(), AuthContextError> {
        match self.saved.take() {
            Some(saved) => self.auth.set(saved),
            None => Ok(()),
        }
    }
}

impl<A: AuthContext + ?Sized> Drop for RestoreOnDrop<'_, A> {
    fn drop(&mut self) {
        if self.saved.is_some()
            && let Err(e) = self.restore()
        {
            warn!(error = %e, "failed to restore authorization context on unwind");
        }
    }
}

/// 認可コンテキストをクリアした状態で `op` を実行し、必ず元に戻す
///
/// # エラーの合成
/// - `op` 失敗・復元成功: `op` のエラー
/// - `op` 成功・復元失敗: 復元エラー
/// - 両方失敗: `op` のエラー（復元エラーは warn ログ）
/// - クリア失敗: `op` は実行せず、ベストエフォートで復元してクリアのエラーを返す
///
/// # 使用例
/// ```ignore
/// let ids = with_elevated_context(auth.as_ref(), || async {
///     engine.query_actionable_tasks(pi, &filter).await.map_err(ResolveError::from)
/// })
/// .await?;
/// ```
pub async fn with_elevated_context<A, F, Fut, T, E>(auth: &A, op: F) -> Result<T, E>
where
    A: AuthContext + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<AuthContextError>,
{
    let saved = auth.current()?;
    let mut guard = RestoreOnDrop::new(auth, saved);

    if let Err(clear_err) = auth.clear() {
        if let Err(e) = guard.restore() {
            warn!(error = %e, "failed to restore authorization context after clear failure");
        }
        return Err(clear_err.into());
    }

    let result = op().await;
    let restored = guard.restore();

    match (result, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore_err)) => Err(restore_err.into()),
        (Err(op_err), Ok(())) => Err(op_err),
        (Err(op_err), Err(restore_err)) => {
            warn!(error = %restore_err, "failed to restore authorization context; returning operation error");
            Err(op_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResolveError, UserId};
    use crate::ports::EngineError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// テスト用の共有コンテキスト（失敗注入つき）
    #[derive(Default)]
    struct RecordingContext {
        current: Mutex<Option<AuthSnapshot>>,
        fail_set: AtomicBool,
        fail_clear: AtomicBool,
    }

    impl RecordingContext {
        fn signed_in(user: &str) -> Self {
            let ctx = Self::default();
            *ctx.current.lock().unwrap() = Some(AuthSnapshot::user(UserId::new(user)));
            ctx
        }

        fn snapshot(&self) -> Option<AuthSnapshot> {
            self.current.lock().unwrap().clone()
        }
    }

    impl AuthContext for RecordingContext {
        fn current(&self) -> Result<Option<AuthSnapshot>, AuthContextError> {
            Ok(self.snapshot())
        }

        fn clear(&self) -> Result<(), AuthContextError> {
            if self.fail_clear.load(Ordering::SeqCst) {
                return Err(AuthContextError::Rejected("clear".into()));
            }
            *self.current.lock().unwrap() = None;
            Ok(())
        }

        fn set(&self, snapshot: Option<AuthSnapshot>) -> Result<(), AuthContextError> {
            if self.fail_set.load(Ordering::SeqCst) {
                return Err(AuthContextError::Rejected("set".into()));
            }
            *self.current.lock().unwrap() = snapshot;
            Ok(())
        }
    }

    #[tokio::test]
    async fn context_is_cleared_inside_and_restored_after() {
        let ctx = RecordingContext::signed_in("alice");
        let before = ctx.snapshot();

        let recorder = &ctx;
        let seen_inside = with_elevated_context(&ctx, move || async move {
            Ok::<_, ResolveError>(recorder.snapshot())
        })
        .await
        .unwrap();

        assert_eq!(seen_inside, None);
        assert_eq!(ctx.snapshot(), before);
    }

    #[tokio::test]
    async fn context_is_restored_when_op_fails() {
        let ctx = RecordingContext::signed_in("alice");
        let before = ctx.snapshot();

        let err = with_elevated_context(&ctx, || async {
            Err::<(), _>(ResolveError::from(EngineError::Unavailable("boom".into())))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ResolveError::Engine(_)));
        assert_eq!(ctx.snapshot(), before);
    }

    #[tokio::test]
    async fn restore_failure_surfaces_after_success() {
        let ctx = RecordingContext::signed_in("alice");
        ctx.fail_set.store(true, Ordering::SeqCst);

        let err = with_elevated_context(&ctx, || async { Ok::<_, ResolveError>(42) })
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::AuthContext(AuthContextError::Rejected(_))));
    }

    #[tokio::test]
    async fn op_error_wins_over_restore_failure() {
        let ctx = RecordingContext::signed_in("alice");
        ctx.fail_set.store(true, Ordering::SeqCst);

        let err = with_elevated_context(&ctx, || async {
            Err::<(), _>(ResolveError::from(EngineError::QueryFailed("bad".into())))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ResolveError::Engine(EngineError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn clear_failure_skips_op() {
        let ctx = RecordingContext::signed_in("alice");
        ctx.fail_clear.store(true, Ordering::SeqCst);
        let ran = AtomicBool::new(false);
        let ran_ref = &ran;

        let err = with_elevated_context(&ctx, move || async move {
            ran_ref.store(true, Ordering::SeqCst);
            Ok::<_, ResolveError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ResolveError::AuthContext(_)));
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(ctx.snapshot(), Some(AuthSnapshot::user(UserId::new("alice"))));
    }

    #[tokio::test]
    async fn context_is_restored_when_future_is_dropped() {
        let ctx = RecordingContext::signed_in("alice");
        let before = ctx.snapshot();

        {
            let fut = with_elevated_context(&ctx, || async {
                std::future::pending::<()>().await;
                Ok::<_, ResolveError>(())
            });
            // 1 回だけ poll してクリア済みの状態にしてから drop する
            let mut fut = Box::pin(fut);
            let poll = futures_poll_once(fut.as_mut()).await;
            assert!(poll.is_none());
            assert_eq!(ctx.snapshot(), None);
        }

        assert_eq!(ctx.snapshot(), before);
    }

    async fn futures_poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = std::future::ready(()) => None,
        }
    }
}
