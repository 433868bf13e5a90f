//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryProcessEngine**: 開発用のプロセスエンジン
//! - **TaskLocalAuthContext**: tokio task-local に載せたセッション
//!
//! # 本番用実装
//! 実エンジン（REST / DB）へのアダプタは別クレートに配置する想定です。

pub mod inmem_engine;
pub mod session_context;

// 主要な型を再エクスポート
pub use self::inmem_engine::{
    InMemoryProcessEngine, InMemoryProcessEngineBuilder, ProcessDefinition, Step, UserTaskDef,
};
pub use self::session_context::TaskLocalAuthContext;
