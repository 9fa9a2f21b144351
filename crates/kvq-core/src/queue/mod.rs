//! Task queue: delivery state, leases, and the in-memory implementation.

mod memory;
mod record;
mod state;

pub use memory::InMemoryQueue;
pub use record::TaskRecord;
pub use state::DeliveryState;

use async_trait::async_trait;

use crate::domain::{Mutation, MutationTask, TaskId, TaskResult};
use crate::error::QueueError;
use crate::observability::QueueCounts;

/// A leased task for processing.
///
/// The worker owns this lease and should `complete` it. A lease dropped
/// without completion puts the task back for redelivery.
#[async_trait]
pub trait TaskLease: Send {
    fn task(&self) -> &MutationTask;

    /// Which delivery of the task this lease is (1 for the first).
    fn delivery(&self) -> u32;

    /// Record the terminal result. A task that is already terminal keeps its
    /// first result. If the result cannot be stored the lease is released
    /// and the task is delivered again.
    async fn complete(self: Box<Self>, result: TaskResult) -> Result<(), QueueError>;
}

/// Queue port.
///
/// Delivery is at-least-once: a task can be handed out more than once, and
/// nothing is promised about ordering across keys.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Accept a mutation and return its TaskId without waiting for execution.
    async fn enqueue(&self, mutation: Mutation) -> Result<TaskId, QueueError>;

    /// Lease one ready task. Waits until one is available; returns `None`
    /// once the queue is closed and drained.
    async fn lease(&self) -> Option<Box<dyn TaskLease>>;

    async fn counts(&self) -> QueueCounts;
}
