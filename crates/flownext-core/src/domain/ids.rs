//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID
//! プロセスインスタンスとタスクの ID は ULID を内部に持ちます。
//! Phantom type パターンで `ProcessInstanceId` と `TaskId` を別の型にしています。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順に並ぶ（ms 単位）
//! - **分散生成可能**: エンジン側で調整なしに発行できる
//!
//! 文字列表現はプレフィックス付き（`proc-01H...`, `task-01H...`）で、
//! コントローラ層との受け渡しは `Display` / `FromStr` で行います。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "proc-", "task-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のメモリは消費しません。
///
/// # 例
/// ```ignore
/// let pi: ProcessInstanceId = Id::from(Ulid::new());
/// let task: TaskId = Id::from(Ulid::new());
/// // pi と task は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Id のパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id '{input}': expected '{prefix}' followed by a ULID")]
pub struct ParseIdError {
    input: String,
    prefix: &'static str,
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    /// プレフィックス付き・なしの両方を受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|_| ParseIdError {
                input: s.to_string(),
                prefix: T::prefix(),
            })
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// ProcessInstance のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessInstance {}

impl IdMarker for ProcessInstance {
    fn prefix() -> &'static str {
        "proc-"
    }
}

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Identifier of a process instance (one running execution of a definition).
pub type ProcessInstanceId = Id<ProcessInstance>;

/// Identifier of a user task inside a process instance.
pub type TaskId = Id<Task>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let pi = ProcessInstanceId::from_ulid(ulid1);
        let task = TaskId::from_ulid(ulid2);

        assert_eq!(pi.as_ulid(), ulid1);
        assert_eq!(task.as_ulid(), ulid2);

        assert!(pi.to_string().starts_with("proc-"));
        assert!(task.to_string().starts_with("task-"));

        // let _: ProcessInstanceId = task; // <- does not compile
    }

    #[test]
    fn display_and_parse_agree() {
        let task = TaskId::from_ulid(Ulid::new());
        let parsed: TaskId = task.to_string().parse().unwrap();
        assert_eq!(parsed, task);

        // プレフィックスなしも受け付ける
        let bare: TaskId = task.as_ulid().to_string().parse().unwrap();
        assert_eq!(bare, task);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "proc-not-a-ulid".parse::<ProcessInstanceId>().unwrap_err();
        assert!(err.to_string().contains("proc-"));
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<ProcessInstanceId>(), size_of::<Ulid>());
        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
    }
}
