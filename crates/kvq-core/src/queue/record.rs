//! Task record: delivery metadata + the task itself.

use tokio::time::{Duration, Instant};

use super::DeliveryState;
use crate::domain::MutationTask;

/// Metadata + task for an entry in the queue.
///
/// - The ready queue holds TaskIds only; this record is the single place
///   delivery state lives.
/// - Only queued or leased tasks have a record.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task: MutationTask,
    pub state: DeliveryState,

    /// Number of times this task has been handed to a worker.
    pub deliveries: u32,

    /// Lease expiry (for Leased state).
    pub lease_deadline: Option<Instant>,

    pub created_at: Instant,
    pub updated_at: Instant,
}

impl TaskRecord {
    pub fn new(task: MutationTask) -> Self {
        let now = Instant::now();
        Self {
            task,
            state: DeliveryState::Queued,
            deliveries: 0,
            lease_deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as leased; returns the delivery number identifying this lease.
    pub fn start_lease(&mut self, timeout: Duration) -> u32 {
        let now = Instant::now();
        self.state = DeliveryState::Leased;
        self.deliveries += 1;
        self.lease_deadline = Some(now + timeout);
        self.updated_at = now;
        self.deliveries
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.state == DeliveryState::Leased && self.lease_deadline.is_some_and(|d| d <= now)
    }

    /// Move a leased task back to Queued for redelivery.
    pub fn requeue(&mut self) {
        self.state = DeliveryState::Queued;
        self.lease_deadline = None;
        self.updated_at = Instant::now();
    }
}
