use thiserror::Error;

/// Failure raised by a store adapter.
///
/// Adapters collapse every backend-specific error into this one kind; the
/// message is kept verbatim so it can be surfaced as a terminal task message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StoreError::Unavailable { message } => message,
        }
    }
}

/// Failure raised by the task queue or its result backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
}
