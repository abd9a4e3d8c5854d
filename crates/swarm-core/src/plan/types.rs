use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The work breakdown for one prompt. Built once per run, read-only after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub prompt: String,
    pub project_name: String,
    pub slug: String,
    pub goals: Vec<String>,
    /// One task per roster agent, in roster order.
    pub tasks: Vec<Task>,
}

impl Plan {
    pub fn task_for(&self, agent_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.agent_id == agent_id)
    }
}

/// The part of a [`Plan`] that is fixed before any task is constructed.
/// Agents build their task from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutline {
    pub id: Uuid,
    pub prompt: String,
    pub project_name: String,
    pub slug: String,
    pub goals: Vec<String>,
}

/// One agent's unit of work within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub agent_id: String,
    pub agent_name: String,
    pub specialization: String,
}

/// What an agent's task constructor returns; the plan builder attaches the
/// agent identity to turn it into a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: String,
    pub title: String,
    pub description: String,
}
