//! Run state machine.
//!
//! ```text
//! Planning -> Running(0) -> Running(1) -> ... -> Materializing -> Completed
//!                                                             \-> Failed
//! ```

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Planning,
    Running { task_index: usize },
    Materializing,
    Completed,
    Failed,
}

impl RunState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Planning, Running { task_index: 0 }) => true,
            (Planning, Materializing) => true,
            (Running { task_index: a }, Running { task_index: b }) => b == a + 1,
            (Running { .. }, Materializing) => true,
            (Materializing, Completed | Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Planning => write!(f, "planning"),
            RunState::Running { task_index } => write!(f, "running({task_index})"),
            RunState::Materializing => write!(f, "materializing"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks the current [`RunState`] of one run and logs every transition.
#[derive(Debug)]
pub(crate) struct RunTracker {
    plan_id: Option<Uuid>,
    state: RunState,
}

impl RunTracker {
    pub(crate) fn new() -> Self {
        tracing::debug!(state = %RunState::Planning, "run state initialised");
        Self {
            plan_id: None,
            state: RunState::Planning,
        }
    }

    pub(crate) fn set_plan(&mut self, plan_id: Uuid) {
        self.plan_id = Some(plan_id);
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        let plan_id = self.plan_id.map(|id| id.to_string()).unwrap_or_default();
        if !self.state.can_advance_to(next) {
            tracing::error!(
                plan_id = %plan_id,
                from = %self.state,
                to = %next,
                "unexpected run state transition"
            );
        } else {
            tracing::debug!(
                plan_id = %plan_id,
                from = %self.state,
                to = %next,
                "run state transition"
            );
        }
        self.state = next;
    }
}
