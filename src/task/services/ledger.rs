//! Service layer for task creation and state machine orchestration.

use crate::agent::domain::AgentId;
use crate::event::{domain::StreamEvent, ports::EventSink};
use crate::task::{
    domain::{
        ParseTaskStateError, ProgressUpdate, Task, TaskDomainError, TaskId, TaskQuery, TaskState,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    owner: AgentId,
    target: Option<AgentId>,
    input: Value,
}

impl CreateTaskRequest {
    /// Creates a request for a task owned by `owner`.
    #[must_use]
    pub const fn new(owner: AgentId) -> Self {
        Self {
            owner,
            target: None,
            input: Value::Null,
        }
    }

    /// Sets the agent expected to perform the work.
    #[must_use]
    pub fn with_target(mut self, target: AgentId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the opaque input payload.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }
}

/// Request payload for moving a task to another state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTaskRequest {
    task_id: TaskId,
    state: String,
    payload: Option<Value>,
}

impl TransitionTaskRequest {
    /// Creates a request moving `task_id` to the state named `state`.
    #[must_use]
    pub fn new(task_id: TaskId, state: impl Into<String>) -> Self {
        Self {
            task_id,
            state: state.into(),
            payload: None,
        }
    }

    /// Sets the result (for `completed`) or error (for `failed`) payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Service-level errors for task ledger operations.
#[derive(Debug, Error)]
pub enum TaskLedgerError {
    /// The state machine rejected the operation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The requested state name is unknown.
    #[error(transparent)]
    InvalidState(#[from] ParseTaskStateError),
    /// No task has the identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task ledger operations.
pub type TaskLedgerResult<T> = Result<T, TaskLedgerError>;

/// Task ledger service.
///
/// Every mutation holds a write gate across check, apply and emit, so each
/// subscriber receives the events of a task in the order its changes were
/// applied. The repository lock is released before the event is emitted.
pub struct TaskLedgerService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    sink: Arc<dyn EventSink>,
    gate: Mutex<()>,
}

impl<R, C> TaskLedgerService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a ledger that reports changes to `sink`.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            repository,
            clock,
            sink,
            gate: Mutex::new(()),
        }
    }

    /// Creates a task in `submitted`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskLedgerResult<Task> {
        let CreateTaskRequest {
            owner,
            target,
            input,
        } = request;
        let task = Task::new(owner, target, input, &*self.clock);
        self.repository.store(&task).await?;
        tracing::info!(task_id = %task.id(), owner = %task.owner(), "task created");
        Ok(task)
    }

    /// Returns the task with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::NotFound`] when the task does not exist, or
    /// [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn get(&self, id: TaskId) -> TaskLedgerResult<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskLedgerError::NotFound(id))
    }

    /// Returns every task matching `query`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn list(&self, query: &TaskQuery) -> TaskLedgerResult<Vec<Task>> {
        Ok(self.repository.list(query).await?)
    }

    /// Applies a state transition and emits its event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::InvalidState`] for an unknown state name,
    /// [`TaskLedgerError::NotFound`] when the task does not exist,
    /// [`TaskLedgerError::Domain`] when the state machine rejects the
    /// transition (the task is left unchanged), or
    /// [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn transition(&self, request: TransitionTaskRequest) -> TaskLedgerResult<Task> {
        let TransitionTaskRequest {
            task_id,
            state,
            payload,
        } = request;
        let target = TaskState::try_from(state.as_str())?;
        self.transition_to(task_id, target, payload).await
    }

    /// Cancels a task from any non-terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::Domain`] when the task is already terminal,
    /// [`TaskLedgerError::NotFound`] when it does not exist, or
    /// [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn cancel(&self, id: TaskId) -> TaskLedgerResult<Task> {
        self.transition_to(id, TaskState::Cancelled, None).await
    }

    /// Reports progress on a `working` task.
    ///
    /// Values are clamped to `[0.0, 1.0]`. A value that does not exceed the
    /// current progress changes nothing and emits no event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::Domain`] when the task is not `working` or
    /// the value is not finite, [`TaskLedgerError::NotFound`] when the task
    /// does not exist, or [`TaskLedgerError::Repository`] when persistence
    /// fails.
    pub async fn set_progress(&self, id: TaskId, value: f64) -> TaskLedgerResult<Task> {
        let _gate = self.gate.lock().await;
        let mut task = self.get(id).await?;
        match task.set_progress(value, &*self.clock)? {
            ProgressUpdate::Advanced { previous, current } => {
                self.repository.update(&task).await?;
                self.sink.emit(StreamEvent::task_progress(&task));
                tracing::debug!(task_id = %id, previous, current, "task progress advanced");
            }
            ProgressUpdate::Unchanged => {
                tracing::debug!(task_id = %id, value, "task progress not advanced");
            }
        }
        Ok(task)
    }

    /// Removes a task from the ledger without emitting an event.
    ///
    /// Used by the storage collaborator once it has persisted or expired the
    /// record. Returns `None` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLedgerError::Repository`] when persistence fails.
    pub async fn evict(&self, id: TaskId) -> TaskLedgerResult<Option<Task>> {
        let _gate = self.gate.lock().await;
        let evicted = self.repository.remove(id).await?;
        if evicted.is_some() {
            tracing::info!(task_id = %id, "task evicted");
        }
        Ok(evicted)
    }

    async fn transition_to(
        &self,
        id: TaskId,
        target: TaskState,
        payload: Option<Value>,
    ) -> TaskLedgerResult<Task> {
        let _gate = self.gate.lock().await;
        let mut task = self.get(id).await?;
        let change = task
            .transition_to(target, payload, &*self.clock)
            .inspect_err(|err| {
                tracing::warn!(task_id = %id, error = %err, "task transition rejected");
            })?;
        self.repository.update(&task).await?;
        self.sink.emit(StreamEvent::task_transition(&task, change));
        tracing::info!(
            task_id = %id,
            from = %change.from,
            to = %change.to,
            "task transitioned"
        );
        Ok(task)
    }
}
