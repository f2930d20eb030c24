//! Task aggregate root and the task state machine.

use super::{ParseTaskStateError, TaskDomainError, TaskId};
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been created but no agent has started it.
    Submitted,
    /// Task is being worked on.
    Working,
    /// Task is blocked waiting for input from the requester.
    InputRequired,
    /// Task work is temporarily paused.
    Paused,
    /// Task finished successfully.
    Completed,
    /// Task finished unsuccessfully.
    Failed,
    /// Task was aborted by its requester.
    Cancelled,
}

impl TaskState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Submitted,
        Self::Working,
        Self::InputRequired,
        Self::Paused,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::InputRequired => "input-required",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether no transition leaves this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Terminal states are strictly terminal; reopening a finished task
    /// would need its own transition rule.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Submitted, Self::Working | Self::Cancelled)
                | (
                    Self::Working,
                    Self::InputRequired
                        | Self::Paused
                        | Self::Completed
                        | Self::Failed
                        | Self::Cancelled
                )
                | (
                    Self::InputRequired | Self::Paused,
                    Self::Working | Self::Cancelled
                )
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseTaskStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "submitted" => Ok(Self::Submitted),
            "working" => Ok(Self::Working),
            "input-required" => Ok(Self::InputRequired),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStateError(value.to_owned())),
        }
    }
}

/// One entry of a task's transition history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// State before the transition.
    pub from: TaskState,
    /// State after the transition.
    pub to: TaskState,
    /// When the transition was applied.
    pub at: DateTime<Utc>,
}

/// Outcome of a progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Progress moved forward.
    Advanced {
        /// Progress before the update.
        previous: f64,
        /// Progress after the update.
        current: f64,
    },
    /// The reported value did not exceed the current progress.
    Unchanged,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    owner: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    input: Value,
    state: TaskState,
    progress: f64,
    history: Vec<StateChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in [`TaskState::Submitted`].
    #[must_use]
    pub fn new(owner: AgentId, target: Option<AgentId>, input: Value, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner,
            target,
            input,
            state: TaskState::Submitted,
            progress: 0.0,
            history: Vec::new(),
            result: None,
            error: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the requesting agent.
    #[must_use]
    pub const fn owner(&self) -> &AgentId {
        &self.owner
    }

    /// Returns the agent expected to perform the work, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&AgentId> {
        self.target.as_ref()
    }

    /// Returns the opaque input payload supplied at creation.
    #[must_use]
    pub const fn input(&self) -> &Value {
        &self.input
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the current progress in `[0.0, 1.0]`.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns every applied transition, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    /// Returns the result payload of a completed task.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the error payload of a failed task.
    #[must_use]
    pub const fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a state transition.
    ///
    /// `payload` becomes the result when entering `completed` and the error
    /// when entering `failed`; it is ignored for every other destination.
    /// Entering `working` from `submitted` resets progress to zero.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the state
    /// machine does not allow the transition. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskState,
        payload: Option<Value>,
        clock: &impl Clock,
    ) -> Result<StateChange, TaskDomainError> {
        if !self.state.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.state,
                to: target,
            });
        }

        let change = StateChange {
            from: self.state,
            to: target,
            at: clock.utc(),
        };

        match (change.from, target) {
            (TaskState::Submitted, TaskState::Working) => self.progress = 0.0,
            (_, TaskState::Completed) => self.result = payload,
            (_, TaskState::Failed) => self.error = payload,
            _ => {}
        }

        self.state = target;
        self.history.push(change);
        self.updated_at = change.at;
        Ok(change)
    }

    /// Cancels the task from any non-terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task has
    /// already reached a terminal state.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<StateChange, TaskDomainError> {
        self.transition_to(TaskState::Cancelled, None, clock)
    }

    /// Reports progress while the task is `working`.
    ///
    /// Values outside `[0.0, 1.0]` are clamped. A value that does not exceed
    /// the current progress leaves the task untouched so progress never
    /// decreases.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ProgressRequiresWorking`] outside the
    /// `working` state, or [`TaskDomainError::NonFiniteProgress`] for `NaN`
    /// and infinities.
    pub fn set_progress(
        &mut self,
        value: f64,
        clock: &impl Clock,
    ) -> Result<ProgressUpdate, TaskDomainError> {
        if self.state != TaskState::Working {
            return Err(TaskDomainError::ProgressRequiresWorking {
                task_id: self.id,
                state: self.state,
            });
        }
        if !value.is_finite() {
            return Err(TaskDomainError::NonFiniteProgress);
        }

        let clamped = value.clamp(0.0, 1.0);
        if clamped <= self.progress {
            return Ok(ProgressUpdate::Unchanged);
        }

        let previous = self.progress;
        self.progress = clamped;
        self.updated_at = clock.utc();
        Ok(ProgressUpdate::Advanced {
            previous,
            current: clamped,
        })
    }
}
