//! Mutation executor: conditional create/update/delete against the store.
//!
//! # check-then-act
//! `exists` と `set`/`delete` は別々の store 呼び出しで、間に原子性はありません。
//! 同じ key に対して並行に走る task は古い存在判定を見て両方とも進むことがあります。
//! 保証するのは「key ごとの競合が少ない前提でのベストエフォートな条件付き mutation」までです。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Mutation, MutationTask, Rejection, TaskResult};
use crate::error::StoreError;
use crate::ports::KvStore;

pub const KEY_CREATED: &str = "Key created successfully";
pub const KEY_UPDATED: &str = "Key updated successfully";
pub const KEY_DELETED: &str = "Key deleted successfully";

/// Why a mutation did not apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct MutationExecutor {
    store: Arc<dyn KvStore>,
}

impl MutationExecutor {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Execute one delivered task and produce its terminal result.
    ///
    /// The task's recorded status is never consulted: a re-delivered task is
    /// re-derived from the current store state. Store failures end up as an
    /// error result carrying the adapter's message; nothing is retried here.
    pub async fn execute(&self, task: &MutationTask) -> TaskResult {
        match self.apply(task.mutation()).await {
            Ok(message) => TaskResult::success(message),
            Err(ExecutionError::Rejected(rejection)) => {
                debug!(task_id = %task.id(), key = %task.key(), %rejection, "mutation rejected");
                rejection.into()
            }
            Err(ExecutionError::Store(err)) => {
                warn!(task_id = %task.id(), key = %task.key(), error = %err, "store unavailable during mutation");
                TaskResult::from(&err)
            }
        }
    }

    /// Apply a mutation, returning the success message.
    pub async fn apply(&self, mutation: &Mutation) -> Result<&'static str, ExecutionError> {
        match mutation {
            Mutation::Create { key, value } => {
                if self.store.exists(key).await? {
                    return Err(Rejection::AlreadyExists.into());
                }
                self.store.set(key, value).await?;
                Ok(KEY_CREATED)
            }
            Mutation::Update { key, value } => {
                if !self.store.exists(key).await? {
                    return Err(Rejection::TargetNotFound.into());
                }
                self.store.set(key, value).await?;
                Ok(KEY_UPDATED)
            }
            Mutation::Delete { key } => {
                if !self.store.exists(key).await? {
                    return Err(Rejection::TargetNotFound.into());
                }
                self.store.delete(key).await?;
                Ok(KEY_DELETED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResultStatus, TaskId, TaskStatus};
    use crate::impls::{FaultyStore, InMemoryStore, StoreOp};
    use rstest::rstest;
    use ulid::Ulid;

    fn task(mutation: Mutation) -> MutationTask {
        MutationTask::new(TaskId::from_ulid(Ulid::new()), mutation)
    }

    fn executor_over(store: &Arc<InMemoryStore>) -> MutationExecutor {
        let store: Arc<dyn KvStore> = store.clone();
        MutationExecutor::new(store)
    }

    #[tokio::test]
    async fn create_on_absent_key_sets_value() {
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_over(&store);

        let result = executor.execute(&task(Mutation::create("a", "1"))).await;

        assert_eq!(result, TaskResult::success(KEY_CREATED));
        assert!(store.exists("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn create_on_present_key_keeps_existing_value() {
        let store = Arc::new(InMemoryStore::with_entries([("a", "1")]));
        let executor = executor_over(&store);

        let result = executor.execute(&task(Mutation::create("a", "2"))).await;

        assert_eq!(result, TaskResult::error("Key already exists"));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[rstest]
    #[case::update(Mutation::update("missing", "x"))]
    #[case::delete(Mutation::delete("missing"))]
    #[tokio::test]
    async fn update_and_delete_on_absent_key_are_rejected(#[case] mutation: Mutation) {
        let store = Arc::new(InMemoryStore::with_entries([("other", "v")]));
        let executor = executor_over(&store);

        let result = executor.execute(&task(mutation)).await;

        assert_eq!(result, TaskResult::error("Key not found"));
        assert_eq!(store.len().await, 1);
        assert!(!store.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn update_on_present_key_replaces_value() {
        let store = Arc::new(InMemoryStore::with_entries([("a", "1")]));
        let executor = executor_over(&store);

        let result = executor.execute(&task(Mutation::update("a", "2"))).await;

        assert_eq!(result, TaskResult::success(KEY_UPDATED));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn delete_on_present_key_removes_it() {
        let store = Arc::new(InMemoryStore::with_entries([("a", "1")]));
        let executor = executor_over(&store);

        let result = executor.execute(&task(Mutation::delete("a"))).await;

        assert_eq!(result, TaskResult::success(KEY_DELETED));
        assert!(!store.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn reexecution_is_derived_from_store_not_cached_status() {
        let store = Arc::new(InMemoryStore::new());
        let executor = executor_over(&store);
        let mut create = task(Mutation::create("a", "1"));

        let first = executor.execute(&create).await;
        assert!(create.finish(&first));
        assert_eq!(create.status(), TaskStatus::Success);

        // key が残っている間は「既に存在する」
        let again = executor.execute(&create).await;
        assert_eq!(again, TaskResult::error("Key already exists"));

        // key が消えた後は再び成功する
        store.delete("a").await.unwrap();
        let after_delete = executor.execute(&create).await;
        assert_eq!(after_delete, TaskResult::success(KEY_CREATED));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[rstest]
    #[case::exists_fails(StoreOp::Exists, Mutation::create("a", "1"))]
    #[case::set_fails(StoreOp::Set, Mutation::create("a", "1"))]
    #[case::delete_fails(StoreOp::Delete, Mutation::delete("b"))]
    #[tokio::test]
    async fn store_failure_becomes_error_result(#[case] op: StoreOp, #[case] mutation: Mutation) {
        let store = Arc::new(
            FaultyStore::new(InMemoryStore::with_entries([("b", "2")]))
                .fail_always()
                .only(op)
                .with_message("Error 111 connecting to redis-kv-service:6379. Connection refused."),
        );
        let executor = MutationExecutor::new(store.clone());

        let result = executor.execute(&task(mutation)).await;

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(
            result.message,
            "Error 111 connecting to redis-kv-service:6379. Connection refused."
        );
        // 失敗した操作は一度だけ呼ばれる（executor はリトライしない）
        assert_eq!(store.calls(op), 1);
        assert!(store.inner().exists("b").await.unwrap());
        assert!(!store.inner().exists("a").await.unwrap());
    }
}
