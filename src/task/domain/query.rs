//! Listing criteria for tasks.

use super::{Task, TaskState};
use crate::agent::domain::AgentId;

/// Criteria used to list tasks. Unset fields match every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Requesting agent.
    pub owner: Option<AgentId>,
    /// Current lifecycle state.
    pub state: Option<TaskState>,
}

impl TaskQuery {
    /// Returns whether `task` satisfies the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let owner_matches = self
            .owner
            .as_ref()
            .is_none_or(|owner| task.owner() == owner);
        let state_matches = self.state.is_none_or(|state| task.state() == state);
        owner_matches && state_matches
    }
}
