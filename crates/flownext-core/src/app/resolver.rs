//! FlowToNextResolver - 完了直後に「次にやること」を決める
//!
//! # フロー（1 イテレーション）
//! 1. 認可コンテキストを退避・クリア（`with_elevated_context`）
//! 2. TaskMatchQuery で候補タスクを検索
//! 3. 候補が空なら ProcessLiveness で生存確認
//! 4. コンテキストを復元
//! 5. `classify` で判定 → Found / Ended / TimedOut なら返す、Continue なら interval だけ sleep
//!
//! sleep は呼び出し元のタスク上で行い、バックグラウンドのワーカーは持ちません。
//! sleep 中に昇格したコンテキストが残ることはありません（復元は 4 で済んでいる）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::app::guard::with_elevated_context;
use crate::app::task_match::{ProcessLiveness, TaskMatchQuery};
use crate::config::ResolverConfig;
use crate::domain::{
    AssigneeFilter, CandidateTaskSet, CompletedTask, FlowToNextOutcome, FlowToNextRequest,
    FlowToNextView, PeekOutcome, PollBudget, ProcessInstanceId, ResolveError, UserId, classify,
    timeout_from_secs,
};
use crate::ports::{AuthContext, Clock, ProcessEngine, SystemClock};

/// FlowToNextResolver はポーリング版と単発版の両方を提供
///
/// # 使用例
/// ```ignore
/// let resolver = FlowToNextResolver::new(engine, auth).with_config(config);
/// let outcome = resolver
///     .resolve(pi, &AssigneeFilter::Any, Duration::from_secs(10))
///     .await?;
/// ```
pub struct FlowToNextResolver {
    engine: Arc<dyn ProcessEngine>,
    auth: Arc<dyn AuthContext>,
    clock: Arc<dyn Clock>,
    config: ResolverConfig,
}

impl FlowToNextResolver {
    pub fn new(engine: Arc<dyn ProcessEngine>, auth: Arc<dyn AuthContext>) -> Self {
        Self {
            engine,
            auth,
            clock: Arc::new(SystemClock),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// 次のタスクが現れる・インスタンスが終わる・期限が来るまでポーリングする
    ///
    /// `timeout` が 0 でも最低 1 回はクエリしてから期限を判定します。
    /// エンジンや認可コンテキストのエラーは即座に返し、リトライしません。
    pub async fn resolve(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
        timeout: Duration,
    ) -> Result<FlowToNextOutcome, ResolveError> {
        let started = self.clock.now();
        let budget = PollBudget::starting_at(started, timeout, self.config.poll_interval());
        info!(
            process_instance_id = %process_instance_id,
            filter = %filter,
            timeout_ms = timeout.as_millis() as u64,
            "resolving flow-to-next"
        );

        let mut iteration: u32 = 0;
        loop {
            iteration += 1;
            let (candidates, alive) = self.observe(process_instance_id, filter).await?;
            let decision = classify(
                candidates,
                || alive.unwrap_or(true),
                self.clock.now(),
                &budget,
            );

            let Some(outcome) = decision.into_outcome() else {
                debug!(
                    process_instance_id = %process_instance_id,
                    iteration,
                    "no next task yet"
                );
                self.clock.sleep(budget.interval()).await;
                continue;
            };

            info!(
                process_instance_id = %process_instance_id,
                outcome = ?outcome.kind(),
                next = outcome.task_ids().len(),
                iterations = iteration,
                elapsed_ms = (self.clock.now() - started).as_millis() as u64,
                "flow-to-next resolved"
            );
            return Ok(outcome);
        }
    }

    /// 1 回だけ問い合わせて即座に返す（外部クライアントが自分でポーリングする場合）
    pub async fn peek(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
    ) -> Result<PeekOutcome, ResolveError> {
        let (candidates, alive) = self.observe(process_instance_id, filter).await?;
        let now = self.clock.now();
        let budget = PollBudget::starting_at(now, Duration::ZERO, self.config.poll_interval());
        let outcome = classify(candidates, || alive.unwrap_or(true), now, &budget).into_peek();
        debug!(
            process_instance_id = %process_instance_id,
            outcome = ?outcome.kind(),
            "flow-to-next peek"
        );
        Ok(outcome)
    }

    /// 完了したタスクから解決する
    ///
    /// `filter` を省略するとタスクの担当者で絞り込む（未割り当てなら Any）。
    pub async fn resolve_after_task(
        &self,
        task: &CompletedTask,
        filter: Option<AssigneeFilter>,
        timeout: Duration,
    ) -> Result<FlowToNextOutcome, ResolveError> {
        let filter = filter.unwrap_or_else(|| AssigneeFilter::for_user(task.assignee.clone()));
        self.resolve(task.process_instance_id, &filter, timeout).await
    }

    /// プロセスインスタンスから解決する（`assignee` 省略時は Any）
    pub async fn resolve_for_instance(
        &self,
        process_instance_id: ProcessInstanceId,
        assignee: Option<UserId>,
        timeout: Duration,
    ) -> Result<FlowToNextOutcome, ResolveError> {
        self.resolve(
            process_instance_id,
            &AssigneeFilter::for_user(assignee),
            timeout,
        )
        .await
    }

    // ────────────────────────────────────────────────────────────────────────
    // コントローラ向け: 設定のデフォルトを適用して View を返す
    // ────────────────────────────────────────────────────────────────────────

    pub async fn flow_to_next_after_task(
        &self,
        task: &CompletedTask,
        request: &FlowToNextRequest,
    ) -> Result<FlowToNextView, ResolveError> {
        let filter = self.filter_for(request, task.assignee.clone());
        let outcome = self
            .resolve(task.process_instance_id, &filter, self.timeout_for(request))
            .await?;
        Ok(FlowToNextView::from(&outcome))
    }

    pub async fn flow_to_next_for_instance(
        &self,
        process_instance_id: ProcessInstanceId,
        request: &FlowToNextRequest,
    ) -> Result<FlowToNextView, ResolveError> {
        let filter = self.filter_for(request, None);
        let outcome = self
            .resolve(process_instance_id, &filter, self.timeout_for(request))
            .await?;
        Ok(FlowToNextView::from(&outcome))
    }

    pub async fn peek_view(
        &self,
        process_instance_id: ProcessInstanceId,
        request: &FlowToNextRequest,
    ) -> Result<FlowToNextView, ResolveError> {
        let filter = self.filter_for(request, None);
        let outcome = self.peek(process_instance_id, &filter).await?;
        Ok(FlowToNextView::from(&outcome))
    }

    fn filter_for(&self, request: &FlowToNextRequest, fallback: Option<UserId>) -> AssigneeFilter {
        let ignore = request
            .ignore_assignee
            .unwrap_or(self.config.ignore_assignee);
        AssigneeFilter::from_request(request.assignee.clone().or(fallback), ignore)
    }

    fn timeout_for(&self, request: &FlowToNextRequest) -> Duration {
        request
            .timeout_secs
            .map(timeout_from_secs)
            .unwrap_or_else(|| self.config.default_timeout())
    }

    /// 1 イテレーション分の読み取り（候補 + 必要なら生存確認）
    ///
    /// 生存確認は候補が空のときだけ行い、そのときだけ `Some` を返す。
    async fn observe(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
    ) -> Result<(CandidateTaskSet, Option<bool>), ResolveError> {
        let engine = self.engine.as_ref();
        with_elevated_context(self.auth.as_ref(), move || async move {
            let candidates = TaskMatchQuery::new(engine)
                .query(process_instance_id, filter)
                .await?;
            let alive = if candidates.is_empty() {
                Some(ProcessLiveness::new(engine).is_alive(process_instance_id).await?)
            } else {
                None
            };
            Ok::<_, ResolveError>((candidates, alive))
        })
        .await
    }
}
