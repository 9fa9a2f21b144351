//! Delivery state machine for the queue.

use serde::{Deserialize, Serialize};

/// Delivery state of a task inside the queue.
///
/// State transitions:
/// - Queued -> Leased -> (removed once its result is stored)
/// - Queued -> Leased -> Queued (lease dropped or expired: redelivery)
///
/// A finished task leaves the queue; its result lives in the `ResultBackend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryState {
    /// Ready to be leased by a worker.
    Queued,

    /// Held by a worker until completed, dropped, or expired.
    Leased,
}

impl DeliveryState {
    pub fn is_runnable(self) -> bool {
        matches!(self, DeliveryState::Queued)
    }
}
