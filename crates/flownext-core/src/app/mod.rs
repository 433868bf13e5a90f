//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **FlowToNextResolver**: ポーリングで次のタスク・終了・タイムアウトを判定
//! - **TaskMatchQuery / ProcessLiveness**: 1 回分の読み取り
//! - **with_elevated_context**: 認可コンテキストを退避・復元するスコープ

pub mod guard;
pub mod resolver;
pub mod task_match;

// 主要な型を再エクスポート
pub use self::guard::with_elevated_context;
pub use self::resolver::FlowToNextResolver;
pub use self::task_match::{ProcessLiveness, TaskMatchQuery};
