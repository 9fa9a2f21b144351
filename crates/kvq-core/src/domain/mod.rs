//! Domain model (ids, mutations, tasks, outcomes).

pub mod ids;
pub mod mutation;
pub mod outcome;
pub mod task;

pub use ids::{Id, IdMarker, ParseIdError, TaskId};
pub use mutation::{Mutation, MutationKind};
pub use outcome::{Rejection, ResultStatus, TaskResult};
pub use task::{MutationTask, TaskStatus};
