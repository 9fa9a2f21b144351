use serde::{Deserialize, Serialize};

/// Task counts by delivery state / terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.succeeded + self.failed
    }

    /// Nothing queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.running == 0
    }
}
