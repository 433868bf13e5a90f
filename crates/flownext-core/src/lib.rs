//! flownext-core
//!
//! Flow-To-Next resolution for BPMN-style process engines: after a user
//! completes a task, find the task they should work on next.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, assignee, budget, candidates, decision, outcome, errors）
//! - **ports**: 抽象化レイヤー（ProcessEngine, AuthContext, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（resolver, task_match, guard）
//! - **impls**: 実装（InMemoryProcessEngine, TaskLocalAuthContext）
//! - **config**: `flownext.toml` と環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::FlowToNextResolver;
pub use self::config::{ConfigError, ResolverConfig};
pub use self::domain::{
    AssigneeFilter, ErrorKind, FlowToNextOutcome, FlowToNextRequest, FlowToNextView, PeekOutcome,
    ResolveError,
};
