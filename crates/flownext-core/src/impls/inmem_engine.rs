//! InMemoryProcessEngine - 開発・テスト用のプロセスエンジン
//!
//! # 学習ポイント
//! - `Arc<Mutex<_>>` の共有状態と `tokio::spawn` による遅延継続
//! - ロックは同期関数の中だけで取り、await を跨がない
//! - エンジン側の認可チェック（アンビエントコンテキストで可視タスクを絞り込む）
//!
//! BPMN の実行器ではありません。リゾルバが観測するもの（実行可能タスク、担当者、
//! 候補ユーザー・グループ、生存状態、非同期の継続）だけをモデル化しています。
//!
//! # 使用例
//! ```ignore
//! let engine = InMemoryProcessEngine::new();
//! let def = ProcessDefinition::new("onboarding")
//!     .user_task(UserTaskDef::new("T1"))
//!     .user_task(UserTaskDef::new("T2"));
//! let pi = engine.start_process(def)?;
//! let t1 = engine.open_tasks(pi)?[0].id;
//! let completed = engine.complete_task(t1)?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{
    ActionableTask, AssigneeFilter, CompletedTask, GroupId, ProcessInstanceId, TaskId, UserId,
};
use crate::ports::{
    AuthContext, Clock, EngineError, IdGenerator, ProcessEngine, SystemClock, UlidGenerator,
};

/// ユーザータスクの定義
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTaskDef {
    pub name: String,
    pub assignee: Option<UserId>,
    pub candidate_users: Vec<UserId>,
    pub candidate_groups: Vec<GroupId>,
}

impl UserTaskDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn assigned_to(mut self, user: UserId) -> Self {
        self.assignee = Some(user);
        self
    }

    pub fn candidate_user(mut self, user: UserId) -> Self {
        self.candidate_users.push(user);
        self
    }

    pub fn candidate_group(mut self, group: GroupId) -> Self {
        self.candidate_groups.push(group);
        self
    }
}

/// プロセス定義の 1 ステップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// ユーザータスク 1 つ
    UserTask(UserTaskDef),
    /// 並列分岐: 全タスクが完了すると合流して次へ進む
    Parallel(Vec<UserTaskDef>),
    /// タイマー（バックグラウンドジョブ）: ユーザータスクなしで一定時間後に次へ進む
    Timer(Duration),
    /// 外部イベント待ち: `release()` されるまでユーザータスクなしで生存し続ける
    Hold,
}

/// 直列に並んだステップの列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDefinition {
    pub key: String,
    pub steps: Vec<Step>,
}

impl ProcessDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            steps: Vec::new(),
        }
    }

    pub fn user_task(mut self, def: UserTaskDef) -> Self {
        self.steps.push(Step::UserTask(def));
        self
    }

    pub fn parallel(mut self, defs: Vec<UserTaskDef>) -> Self {
        self.steps.push(Step::Parallel(defs));
        self
    }

    pub fn timer(mut self, after: Duration) -> Self {
        self.steps.push(Step::Timer(after));
        self
    }

    pub fn hold(mut self) -> Self {
        self.steps.push(Step::Hold);
        self
    }
}

/// インスタンスごとの状態
struct InstanceState {
    definition: Arc<ProcessDefinition>,
    /// 現在のステップの位置（steps.len() 以上なら終端）
    cursor: usize,
    /// 現在のステップで開いているタスク（作成順）
    open_tasks: Vec<ActionableTask>,
    ended: bool,
}

impl InstanceState {
    fn current_step(&self) -> Option<&Step> {
        self.definition.steps.get(self.cursor)
    }
}

#[derive(Default)]
struct EngineState {
    instances: HashMap<ProcessInstanceId, InstanceState>,
    /// 開いているタスク → インスタンス
    task_index: HashMap<TaskId, ProcessInstanceId>,
    /// ユーザー → 所属グループ（候補グループの判定用）
    memberships: HashMap<UserId, Vec<GroupId>>,
    next_seq: u64,
}

/// 遅延実行の種類
#[derive(Debug, Clone, Copy)]
enum Wakeup {
    /// 非同期継続: 現在のステップに入る
    EnterCurrent,
    /// タイマー満了: 次のステップへ進む
    TimerFired,
}

struct Inner {
    state: Mutex<EngineState>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    /// タスク完了から次のステップが現れるまでの遅延（0 なら同期）
    continuation_delay: Duration,
    /// エンジン側の認可チェックに使うアンビエントコンテキスト
    auth: Option<Arc<dyn AuthContext>>,
}

/// InMemoryProcessEngineBuilder はエンジンの構築オプションを集める
///
/// # 使用例
/// ```ignore
/// let engine = InMemoryProcessEngine::builder()
///     .continuation_delay(Duration::from_millis(300))
///     .authorization(auth)
///     .build();
/// ```
pub struct InMemoryProcessEngineBuilder {
    clock: Arc<dyn Clock>,
    continuation_delay: Duration,
    auth: Option<Arc<dyn AuthContext>>,
}

impl Default for InMemoryProcessEngineBuilder {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            continuation_delay: Duration::ZERO,
            auth: None,
        }
    }
}

impl InMemoryProcessEngineBuilder {
    /// タスク作成時刻・ID のタイムスタンプ・遅延実行の待ちに使う Clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 完了後の継続をバックグラウンドジョブ扱いにする
    pub fn continuation_delay(mut self, delay: Duration) -> Self {
        self.continuation_delay = delay;
        self
    }

    pub fn authorization(mut self, auth: Arc<dyn AuthContext>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn build(self) -> InMemoryProcessEngine {
        InMemoryProcessEngine {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState::default()),
                ids: Box::new(UlidGenerator::new(self.clock.clone())),
                clock: self.clock,
                continuation_delay: self.continuation_delay,
                auth: self.auth,
            }),
        }
    }
}

/// InMemoryProcessEngine は `ProcessEngine` のインメモリ実装
///
/// # 実装詳細
/// - 状態は `Arc<Inner>` の `Mutex<EngineState>` に集約
/// - 継続やタイマーは `tokio::spawn` したタスクが Clock で待ってから適用する
///   （tokio ランタイムの中で呼び出すこと）
/// - `authorization()` を設定すると、アンビエントコンテキストにユーザーがいる間は
///   そのユーザーが見られるタスクしか返さない
#[derive(Clone)]
pub struct InMemoryProcessEngine {
    inner: Arc<Inner>,
}

impl InMemoryProcessEngine {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InMemoryProcessEngineBuilder {
        InMemoryProcessEngineBuilder::default()
    }

    /// ユーザーをグループに所属させる
    pub fn add_membership(&self, user: UserId, group: GroupId) -> Result<(), EngineError> {
        let mut st = self.inner.lock()?;
        let groups = st.memberships.entry(user).or_default();
        if !groups.contains(&group) {
            groups.push(group);
        }
        Ok(())
    }

    /// インスタンスを開始し、最初のステップに入る
    pub fn start_process(
        &self,
        definition: ProcessDefinition,
    ) -> Result<ProcessInstanceId, EngineError> {
        let pi = self.inner.ids.generate_process_instance_id();
        let timer = {
            let mut st = self.inner.lock()?;
            st.instances.insert(
                pi,
                InstanceState {
                    definition: Arc::new(definition),
                    cursor: 0,
                    open_tasks: Vec::new(),
                    ended: false,
                },
            );
            self.inner.enter_current_step(&mut st, pi)
        };
        if let Some(after) = timer {
            self.inner.schedule(pi, after, Wakeup::TimerFired);
        }
        debug!(process_instance_id = %pi, "process started");
        Ok(pi)
    }

    /// タスクを完了する
    ///
    /// 並列分岐の最後のタスクなら次のステップへ進む。
    /// `continuation_delay` が設定されていれば、次のステップは遅れて現れる。
    pub fn complete_task(&self, task_id: TaskId) -> Result<CompletedTask, EngineError> {
        let (completed, timer) = {
            let mut st = self.inner.lock()?;
            let pi = st
                .task_index
                .remove(&task_id)
                .ok_or(EngineError::TaskNotFound(task_id))?;
            let inst = st
                .instances
                .get_mut(&pi)
                .ok_or(EngineError::ProcessInstanceNotFound(pi))?;

            let pos = inst
                .open_tasks
                .iter()
                .position(|t| t.id == task_id)
                .ok_or(EngineError::TaskNotFound(task_id))?;
            let task = inst.open_tasks.remove(pos);
            let completed = CompletedTask {
                task_id,
                process_instance_id: pi,
                assignee: task.assignee,
            };

            if !inst.open_tasks.is_empty() {
                // 並列分岐の合流待ち
                (completed, None)
            } else {
                inst.cursor += 1;
                if self.inner.continuation_delay.is_zero() {
                    (completed, self.inner.enter_current_step(&mut st, pi))
                } else {
                    let delay = self.inner.continuation_delay;
                    drop(st);
                    self.inner.schedule(pi, delay, Wakeup::EnterCurrent);
                    (completed, None)
                }
            }
        };
        if let Some(after) = timer {
            self.inner.schedule(completed.process_instance_id, after, Wakeup::TimerFired);
        }
        debug!(task_id = %task_id, process_instance_id = %completed.process_instance_id, "task completed");
        Ok(completed)
    }

    /// タスクを担当者に割り当てる（claim）
    pub fn claim(&self, task_id: TaskId, user: UserId) -> Result<(), EngineError> {
        let mut st = self.inner.lock()?;
        let pi = *st
            .task_index
            .get(&task_id)
            .ok_or(EngineError::TaskNotFound(task_id))?;
        let task = st
            .instances
            .get_mut(&pi)
            .and_then(|inst| inst.open_tasks.iter_mut().find(|t| t.id == task_id))
            .ok_or(EngineError::TaskNotFound(task_id))?;
        task.assignee = Some(user);
        Ok(())
    }

    /// `Hold` ステップで待っているインスタンスを先へ進める
    pub fn release(&self, pi: ProcessInstanceId) -> Result<(), EngineError> {
        let timer = {
            let mut st = self.inner.lock()?;
            let inst = st
                .instances
                .get_mut(&pi)
                .ok_or(EngineError::ProcessInstanceNotFound(pi))?;
            if inst.ended || !matches!(inst.current_step(), Some(Step::Hold)) {
                return Ok(());
            }
            inst.cursor += 1;
            self.inner.enter_current_step(&mut st, pi)
        };
        if let Some(after) = timer {
            self.inner.schedule(pi, after, Wakeup::TimerFired);
        }
        Ok(())
    }

    /// インスタンスを中断して終了させる
    pub fn cancel(&self, pi: ProcessInstanceId) -> Result<(), EngineError> {
        let mut st = self.inner.lock()?;
        let EngineState {
            instances,
            task_index,
            ..
        } = &mut *st;
        let inst = instances
            .get_mut(&pi)
            .ok_or(EngineError::ProcessInstanceNotFound(pi))?;
        for task in inst.open_tasks.drain(..) {
            task_index.remove(&task.id);
        }
        inst.ended = true;
        Ok(())
    }

    /// 認可チェックなしで開いているタスクを返す（作成順）
    pub fn open_tasks(&self, pi: ProcessInstanceId) -> Result<Vec<ActionableTask>, EngineError> {
        let st = self.inner.lock()?;
        let inst = st
            .instances
            .get(&pi)
            .ok_or(EngineError::ProcessInstanceNotFound(pi))?;
        Ok(inst.open_tasks.clone())
    }

    /// タスク ID から開いているタスクを引く
    pub fn task(&self, task_id: TaskId) -> Result<ActionableTask, EngineError> {
        let st = self.inner.lock()?;
        st.task_index
            .get(&task_id)
            .and_then(|pi| st.instances.get(pi))
            .and_then(|inst| inst.open_tasks.iter().find(|t| t.id == task_id))
            .cloned()
            .ok_or(EngineError::TaskNotFound(task_id))
    }

    /// アンビエントコンテキストのユーザー（いれば）が見られるか
    fn visible_to_caller(
        &self,
        task: &ActionableTask,
        memberships: &HashMap<UserId, Vec<GroupId>>,
    ) -> Result<bool, EngineError> {
        let Some(auth) = &self.inner.auth else {
            return Ok(true);
        };
        let snapshot = auth
            .current()
            .map_err(|e| EngineError::Unavailable(format!("authorization check: {e}")))?;
        let Some(snapshot) = snapshot else {
            return Ok(true);
        };

        let mut groups = snapshot.groups.clone();
        if let Some(known) = memberships.get(&snapshot.user_id) {
            groups.extend(known.iter().cloned());
        }
        Ok(AssigneeFilter::User(snapshot.user_id).admits(task, &groups))
    }
}

impl Default for InMemoryProcessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, EngineError> {
        self.state
            .lock()
            .map_err(|_| EngineError::Unavailable("engine state poisoned".into()))
    }

    /// 現在のステップに入る
    ///
    /// ユーザータスクを作るか、終端なら ended にする。
    /// タイマーに入った場合は満了までの時間を返す（呼び出し側がロック解放後に schedule）。
    fn enter_current_step(&self, st: &mut EngineState, pi: ProcessInstanceId) -> Option<Duration> {
        let EngineState {
            instances,
            task_index,
            next_seq,
            ..
        } = st;
        let inst = instances.get_mut(&pi)?;
        if inst.ended {
            return None;
        }

        loop {
            let defs = match inst.current_step() {
                None => {
                    inst.ended = true;
                    debug!(process_instance_id = %pi, "process ended");
                    return None;
                }
                Some(Step::Timer(after)) => return Some(*after),
                Some(Step::Hold) => return None,
                Some(Step::UserTask(def)) => vec![def.clone()],
                Some(Step::Parallel(defs)) => defs.clone(),
            };
            if defs.is_empty() {
                inst.cursor += 1;
                continue;
            }

            for def in defs {
                let task = ActionableTask {
                    id: self.ids.generate_task_id(),
                    process_instance_id: pi,
                    name: def.name,
                    created_at: self.clock.utc_now(),
                    created_seq: *next_seq,
                    assignee: def.assignee,
                    candidate_users: def.candidate_users,
                    candidate_groups: def.candidate_groups,
                };
                *next_seq += 1;
                task_index.insert(task.id, pi);
                inst.open_tasks.push(task);
            }
            return None;
        }
    }

    fn schedule(self: &Arc<Self>, pi: ProcessInstanceId, after: Duration, wakeup: Wakeup) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.clock.sleep(after).await;
            inner.wake(pi, wakeup);
        });
    }

    fn wake(self: &Arc<Self>, pi: ProcessInstanceId, wakeup: Wakeup) {
        let timer = {
            let mut st = match self.lock() {
                Ok(st) => st,
                Err(e) => {
                    warn!(error = %e, process_instance_id = %pi, "dropping continuation");
                    return;
                }
            };
            let Some(inst) = st.instances.get_mut(&pi) else {
                return;
            };
            if inst.ended {
                return;
            }
            if let Wakeup::TimerFired = wakeup {
                inst.cursor += 1;
            }
            self.enter_current_step(&mut st, pi)
        };
        if let Some(after) = timer {
            self.schedule(pi, after, Wakeup::TimerFired);
        }
    }
}

#[async_trait]
impl ProcessEngine for InMemoryProcessEngine {
    async fn query_actionable_tasks(
        &self,
        process_instance_id: ProcessInstanceId,
        filter: &AssigneeFilter,
    ) -> Result<Vec<TaskId>, EngineError> {
        let st = self.inner.lock()?;
        let inst = st
            .instances
            .get(&process_instance_id)
            .ok_or(EngineError::ProcessInstanceNotFound(process_instance_id))?;

        let no_groups = Vec::new();
        let user_groups = filter
            .user()
            .and_then(|u| st.memberships.get(u))
            .unwrap_or(&no_groups);

        let mut matched: Vec<&ActionableTask> = Vec::new();
        for task in &inst.open_tasks {
            if filter.admits(task, user_groups) && self.visible_to_caller(task, &st.memberships)? {
                matched.push(task);
            }
        }
        matched.sort_by_key(|t| t.creation_key());
        Ok(matched.into_iter().map(|t| t.id).collect())
    }

    async fn is_process_instance_active(
        &self,
        process_instance_id: ProcessInstanceId,
    ) -> Result<bool, EngineError> {
        let st = self.inner.lock()?;
        st.instances
            .get(&process_instance_id)
            .map(|inst| !inst.ended)
            .ok_or(EngineError::ProcessInstanceNotFound(process_instance_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuthSnapshot;
    use crate::impls::TaskLocalAuthContext;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};
    use ulid::Ulid;

    fn sequential(n: usize) -> ProcessDefinition {
        (1..=n).fold(ProcessDefinition::new("sequential"), |def, i| {
            def.user_task(UserTaskDef::new(format!("T{i}")))
        })
    }

    #[tokio::test]
    async fn sequential_tasks_advance_on_completion() {
        let engine = InMemoryProcessEngine::new();
        let pi = engine.start_process(sequential(2)).unwrap();

        let open = engine.open_tasks(pi).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, "T1");

        engine.complete_task(open[0].id).unwrap();
        let open = engine.open_tasks(pi).unwrap();
        assert_eq!(open[0].name, "T2");
        assert!(engine.is_process_instance_active(pi).await.unwrap());

        engine.complete_task(open[0].id).unwrap();
        assert!(engine.open_tasks(pi).unwrap().is_empty());
        assert!(!engine.is_process_instance_active(pi).await.unwrap());
    }

    #[tokio::test]
    async fn parallel_tasks_are_ordered_by_creation_and_join() {
        let engine = InMemoryProcessEngine::new();
        let def = ProcessDefinition::new("fan-out")
            .parallel(vec![
                UserTaskDef::new("A"),
                UserTaskDef::new("B"),
                UserTaskDef::new("C"),
            ])
            .user_task(UserTaskDef::new("D"));
        let pi = engine.start_process(def).unwrap();

        let open = engine.open_tasks(pi).unwrap();
        let ids = engine
            .query_actionable_tasks(pi, &AssigneeFilter::Any)
            .await
            .unwrap();
        assert_eq!(ids, open.iter().map(|t| t.id).collect::<Vec<_>>());
        assert_eq!(
            open.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            ["A", "B", "C"]
        );

        // 合流前は次へ進まない
        engine.complete_task(open[1].id).unwrap();
        assert_eq!(engine.open_tasks(pi).unwrap().len(), 2);

        engine.complete_task(open[0].id).unwrap();
        engine.complete_task(open[2].id).unwrap();
        let open = engine.open_tasks(pi).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, "D");
    }

    /// 呼ばれるたびに 1 時間巻き戻る壁時計
    struct RewindingClock {
        secs: AtomicI64,
    }

    #[async_trait]
    impl Clock for RewindingClock {
        fn now(&self) -> tokio::time::Instant {
            tokio::time::Instant::now()
        }

        fn utc_now(&self) -> DateTime<Utc> {
            let secs = self.secs.fetch_sub(3600, Ordering::SeqCst);
            DateTime::from_timestamp(secs, 0).unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }
    }

    #[tokio::test]
    async fn creation_order_ignores_wall_clock_steps() {
        // 2000-01-01T00:00:00Z
        let start_secs = 946_684_800;
        let engine = InMemoryProcessEngine::builder()
            .clock(Arc::new(RewindingClock {
                secs: AtomicI64::new(start_secs),
            }))
            .build();
        let def = ProcessDefinition::new("fan-out").parallel(vec![
            UserTaskDef::new("A"),
            UserTaskDef::new("B"),
            UserTaskDef::new("C"),
        ]);
        let pi = engine.start_process(def).unwrap();

        let open = engine.open_tasks(pi).unwrap();
        assert!(open[0].created_at > open[2].created_at);

        let ids = engine
            .query_actionable_tasks(pi, &AssigneeFilter::Any)
            .await
            .unwrap();
        let names: Vec<_> = ids
            .iter()
            .map(|id| engine.task(*id).unwrap().name)
            .collect();
        assert_eq!(names, ["A", "B", "C"]);

        // ID のタイムスタンプも注入した Clock から取る
        assert!(ids[0].as_ulid().timestamp_ms() <= start_secs as u64 * 1000);
    }

    #[tokio::test]
    async fn user_filter_uses_memberships() {
        let engine = InMemoryProcessEngine::new();
        engine
            .add_membership(UserId::new("alice"), GroupId::new("clerks"))
            .unwrap();
        let def = ProcessDefinition::new("groups").parallel(vec![
            UserTaskDef::new("clerk work").candidate_group(GroupId::new("clerks")),
            UserTaskDef::new("manager work").candidate_group(GroupId::new("managers")),
            UserTaskDef::new("bob's work").assigned_to(UserId::new("bob")),
        ]);
        let pi = engine.start_process(def).unwrap();
        let open = engine.open_tasks(pi).unwrap();

        let alice = engine
            .query_actionable_tasks(pi, &AssigneeFilter::User(UserId::new("alice")))
            .await
            .unwrap();
        assert_eq!(alice, vec![open[0].id]);

        let bob = engine
            .query_actionable_tasks(pi, &AssigneeFilter::User(UserId::new("bob")))
            .await
            .unwrap();
        assert_eq!(bob, vec![open[2].id]);
    }

    #[tokio::test]
    async fn claimed_task_leaves_other_candidates() {
        let engine = InMemoryProcessEngine::new();
        let def = ProcessDefinition::new("claim").user_task(
            UserTaskDef::new("shared")
                .candidate_user(UserId::new("alice"))
                .candidate_user(UserId::new("bob")),
        );
        let pi = engine.start_process(def).unwrap();
        let task = engine.open_tasks(pi).unwrap()[0].id;

        engine.claim(task, UserId::new("bob")).unwrap();

        let alice = engine
            .query_actionable_tasks(pi, &AssigneeFilter::User(UserId::new("alice")))
            .await
            .unwrap();
        assert!(alice.is_empty());
        assert_eq!(engine.task(task).unwrap().assignee, Some(UserId::new("bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn continuation_delay_keeps_instance_alive_without_tasks() {
        let engine =
            InMemoryProcessEngine::builder()
                .continuation_delay(Duration::from_millis(300))
                .build();
        let pi = engine.start_process(sequential(2)).unwrap();
        let t1 = engine.open_tasks(pi).unwrap()[0].id;

        engine.complete_task(t1).unwrap();
        assert!(engine.open_tasks(pi).unwrap().is_empty());
        assert!(engine.is_process_instance_active(pi).await.unwrap());

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(engine.open_tasks(pi).unwrap()[0].name, "T2");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_step_creates_next_task_later() {
        let engine = InMemoryProcessEngine::new();
        let def = ProcessDefinition::new("timer")
            .timer(Duration::from_secs(2))
            .user_task(UserTaskDef::new("after timer"));
        let pi = engine.start_process(def).unwrap();
        assert!(engine.open_tasks(pi).unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(engine.open_tasks(pi).unwrap()[0].name, "after timer");
    }

    #[tokio::test]
    async fn hold_and_cancel() {
        let engine = InMemoryProcessEngine::new();
        let def = ProcessDefinition::new("hold")
            .hold()
            .user_task(UserTaskDef::new("after hold"));
        let pi = engine.start_process(def).unwrap();
        assert!(engine.open_tasks(pi).unwrap().is_empty());
        assert!(engine.is_process_instance_active(pi).await.unwrap());

        engine.release(pi).unwrap();
        let task = engine.open_tasks(pi).unwrap()[0].id;

        engine.cancel(pi).unwrap();
        assert!(!engine.is_process_instance_active(pi).await.unwrap());
        assert!(matches!(
            engine.complete_task(task),
            Err(EngineError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_instance_is_not_found() {
        let engine = InMemoryProcessEngine::new();
        let pi = ProcessInstanceId::from_ulid(Ulid::new());

        assert_eq!(
            engine.is_process_instance_active(pi).await,
            Err(EngineError::ProcessInstanceNotFound(pi))
        );
        assert_eq!(
            engine.query_actionable_tasks(pi, &AssigneeFilter::Any).await,
            Err(EngineError::ProcessInstanceNotFound(pi))
        );
    }

    #[tokio::test]
    async fn ambient_user_restricts_visibility() {
        let auth = Arc::new(TaskLocalAuthContext);
        let engine = InMemoryProcessEngine::builder().authorization(auth).build();
        let def = ProcessDefinition::new("visibility").parallel(vec![
            UserTaskDef::new("mine").assigned_to(UserId::new("alice")),
            UserTaskDef::new("managers only").candidate_group(GroupId::new("managers")),
        ]);
        let pi = engine.start_process(def).unwrap();

        let as_alice = TaskLocalAuthContext::scope(
            Some(AuthSnapshot::user(UserId::new("alice"))),
            engine.query_actionable_tasks(pi, &AssigneeFilter::Any),
        )
        .await
        .unwrap();
        assert_eq!(as_alice.len(), 1);

        let as_manager = TaskLocalAuthContext::scope(
            Some(AuthSnapshot::user(UserId::new("alice")).with_group(GroupId::new("managers"))),
            engine.query_actionable_tasks(pi, &AssigneeFilter::Any),
        )
        .await
        .unwrap();
        assert_eq!(as_manager.len(), 2);

        let unrestricted = TaskLocalAuthContext::scope(
            None,
            engine.query_actionable_tasks(pi, &AssigneeFilter::Any),
        )
        .await
        .unwrap();
        assert_eq!(unrestricted.len(), 2);
    }
}
