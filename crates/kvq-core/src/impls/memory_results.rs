//! InMemoryResultBackend - task 結果の保存先（開発用）

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{TaskId, TaskResult};
use crate::error::QueueError;
use crate::ports::ResultBackend;

#[derive(Debug, Default)]
pub struct InMemoryResultBackend {
    results: RwLock<HashMap<TaskId, TaskResult>>,
}

impl InMemoryResultBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultBackend for InMemoryResultBackend {
    async fn put(&self, task_id: TaskId, result: TaskResult) -> Result<bool, QueueError> {
        let mut results = self.results.write();
        if results.contains_key(&task_id) {
            return Ok(false);
        }
        results.insert(task_id, result);
        Ok(true)
    }

    async fn get(&self, task_id: TaskId) -> Result<Option<TaskResult>, QueueError> {
        Ok(self.results.read().get(&task_id).cloned())
    }
}
