//! Domain model for the task ledger.
//!
//! The task aggregate owns the state machine, the transition history and
//! the progress invariant. Storage and event delivery stay outside the
//! domain boundary.

mod error;
mod ids;
mod query;
mod task;

pub use error::{ParseTaskStateError, TaskDomainError};
pub use ids::TaskId;
pub use query::TaskQuery;
pub use task::{ProgressUpdate, StateChange, Task, TaskState};
