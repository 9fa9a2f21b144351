//! Terminal task results.
//!
//! Shape on the wire: `{"status": "success"|"error", "message": "..."}`.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: ResultStatus,
    pub message: String,
}

impl TaskResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Policy outcome of a conditional mutation whose existence check did not hold.
///
/// Not an error of the system: it ends the task as Failed with this message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Key already exists")]
    AlreadyExists,

    #[error("Key not found")]
    TargetNotFound,
}

impl From<Rejection> for TaskResult {
    fn from(rejection: Rejection) -> Self {
        TaskResult::error(rejection.to_string())
    }
}

impl From<&StoreError> for TaskResult {
    fn from(err: &StoreError) -> Self {
        TaskResult::error(err.message())
    }
}
