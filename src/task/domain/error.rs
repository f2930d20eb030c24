//! Error types for task state machine validation and parsing.

use super::{TaskId, TaskState};
use thiserror::Error;

/// Errors returned by task aggregate operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested transition is not in the state machine.
    #[error("invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Current state.
        from: TaskState,
        /// Requested state.
        to: TaskState,
    },

    /// Progress was reported while the task was not `working`.
    #[error("progress for task {task_id} can only be set while working (state is {state})")]
    ProgressRequiresWorking {
        /// Task whose progress update was rejected.
        task_id: TaskId,
        /// Current state.
        state: TaskState,
    },

    /// Progress was not a finite number.
    #[error("progress must be a finite number")]
    NonFiniteProgress,

    /// A task identifier could not be parsed.
    #[error("invalid task id '{0}'")]
    InvalidTaskId(String),
}

/// Error returned while parsing task states from the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);
