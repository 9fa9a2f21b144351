//! ResultBackend port - task 結果の保存先
//!
//! 呼び出し側は TaskId で結果を後から取り出します。
//! `get` が `None` を返す間は pending（未完了）として扱います。

use async_trait::async_trait;

use crate::domain::{TaskId, TaskResult};
use crate::error::QueueError;

#[async_trait]
pub trait ResultBackend: Send + Sync {
    /// Store the terminal result for `task_id`.
    ///
    /// The first result wins: returns `false` and keeps the stored value if a
    /// result is already present.
    async fn put(&self, task_id: TaskId, result: TaskResult) -> Result<bool, QueueError>;

    async fn get(&self, task_id: TaskId) -> Result<Option<TaskResult>, QueueError>;
}
