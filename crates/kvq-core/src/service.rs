//! KvService - front end 向けのファサード
//!
//! 書き込みは queue に積んで TaskId を即座に返し、読み込みは
//! RetryGuardedReader を同期的に呼びます。HTTP などの transport は扱いません。

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Mutation, TaskId, TaskResult};
use crate::error::{QueueError, StoreError};
use crate::ports::ResultBackend;
use crate::queue::TaskQueue;
use crate::reader::RetryGuardedReader;

pub const TASK_SUBMITTED: &str = "Task submitted";

/// Enqueue acknowledgment: `{"message": "Task submitted", "task_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub message: String,
    pub task_id: TaskId,
}

/// Read success: `{"key": "...", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// Progress of a submitted task as seen through the result backend.
///
/// An unknown TaskId is indistinguishable from one that has not finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskProgress {
    Pending,
    Finished(TaskResult),
}

pub struct KvService {
    queue: Arc<dyn TaskQueue>,
    reader: RetryGuardedReader,
    results: Arc<dyn ResultBackend>,
}

impl KvService {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        reader: RetryGuardedReader,
        results: Arc<dyn ResultBackend>,
    ) -> Self {
        Self {
            queue,
            reader,
            results,
        }
    }

    pub async fn submit(&self, mutation: Mutation) -> Result<Submission, QueueError> {
        let task_id = self.queue.enqueue(mutation).await?;
        Ok(Submission {
            message: TASK_SUBMITTED.to_string(),
            task_id,
        })
    }

    pub async fn create(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Submission, QueueError> {
        self.submit(Mutation::create(key, value)).await
    }

    pub async fn update(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Submission, QueueError> {
        self.submit(Mutation::update(key, value)).await
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<Submission, QueueError> {
        self.submit(Mutation::delete(key)).await
    }

    /// `Ok(None)` is the not-found signal.
    pub async fn read(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        let value = self.reader.read(key).await?;
        Ok(value.map(|value| Entry {
            key: key.to_string(),
            value,
        }))
    }

    pub async fn task_status(&self, task_id: TaskId) -> Result<TaskProgress, QueueError> {
        Ok(match self.results.get(task_id).await? {
            Some(result) => TaskProgress::Finished(result),
            None => TaskProgress::Pending,
        })
    }

    /// Poll `task_status` until the task finishes or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout.
    pub async fn wait_for_result(
        &self,
        task_id: TaskId,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Option<TaskResult>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let TaskProgress::Finished(result) = self.task_status(task_id).await? {
                return Ok(Some(result));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
