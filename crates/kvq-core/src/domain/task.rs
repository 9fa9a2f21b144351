//! MutationTask: one queued conditional mutation and its recorded outcome.

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::mutation::{Mutation, MutationKind};
use super::outcome::{ResultStatus, TaskResult};

/// Task status.
///
/// State transitions:
/// - Pending -> Success
/// - Pending -> Failed
///
/// Terminal states are never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationTask {
    id: TaskId,
    mutation: Mutation,
    status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_message: Option<String>,
}

impl MutationTask {
    pub fn new(id: TaskId, mutation: Mutation) -> Self {
        Self {
            id,
            mutation,
            status: TaskStatus::Pending,
            result_message: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub fn kind(&self) -> MutationKind {
        self.mutation.kind()
    }

    pub fn key(&self) -> &str {
        self.mutation.key()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result_message(&self) -> Option<&str> {
        self.result_message.as_deref()
    }

    /// Record the terminal outcome.
    ///
    /// Returns `false` (and changes nothing) if the task is already terminal.
    pub fn finish(&mut self, result: &TaskResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = match result.status {
            ResultStatus::Success => TaskStatus::Success,
            ResultStatus::Error => TaskStatus::Failed,
        };
        self.result_message = Some(result.message.clone());
        true
    }
}
