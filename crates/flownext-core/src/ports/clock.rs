//! Clock port - 時刻とスリープの抽象化
//!
//! ポーリングのペース配分（sleep）と期限判定（now）はすべてこのポート経由です。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Clock は単調時刻・壁時計時刻・スリープを提供
///
/// # テスト容易性
/// - trait により時刻を差し替え可能
/// - `SystemClock` は tokio の時刻を使うので、テストでは
///   `#[tokio::test(start_paused = true)]` で時間を進められる
#[async_trait]
pub trait Clock: Send + Sync {
    /// 期限判定用の単調時刻
    fn now(&self) -> Instant;

    /// ID やタスク作成時刻に使う壁時計時刻
    fn utc_now(&self) -> DateTime<Utc>;

    /// 呼び出し元のタスクを `duration` だけ止める
    async fn sleep(&self, duration: Duration);
}

/// SystemClock は tokio ランタイムの時刻を使う本番用 Clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        (**self).utc_now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn system_clock_sleep_advances_monotonic_time() {
        let clock = SystemClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(500)).await;
        assert_eq!(clock.now() - start, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn shared_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let start = clock.now();
        clock.sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(1));
    }
}
