//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! リゾルバが呼び出す外部コラボレータ（ワークフローエンジン、セッション、時計）は
//! すべてここの trait 越しに渡され、グローバルには参照しません。

pub mod auth_context;
pub mod clock;
pub mod id_generator;
pub mod process_engine;

// 主要な trait を再エクスポート
pub use self::auth_context::{AuthContext, AuthContextError};
pub use self::clock::{Clock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::process_engine::{EngineError, ProcessEngine};
