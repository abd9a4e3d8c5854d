use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::RunClock;
use crate::plan::{Plan, Task};

/// Static identity of one roster agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    /// Stable id used for lookup and in events (e.g. `"architecture"`).
    pub id: &'static str,
    pub name: &'static str,
    pub specialization: &'static str,
}

/// How an [`AgentResult`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Returned by the generation service and validated.
    Generated,
    /// Deterministic fallback.
    Synthesized,
}

/// What one agent hands back for its task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub summary: String,
    pub message: String,
    /// Relative path -> file content.
    pub files: BTreeMap<String, String>,
    /// Ids of agents whose work this result builds on. Advisory only.
    pub references: Vec<String>,
    pub source: ResultSource,
}

/// One finished task in an agent's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub task_id: String,
    pub summary: String,
    pub message: String,
    /// Paths this task wrote.
    pub files: Vec<String>,
    pub references: Vec<String>,
    /// Epoch milliseconds.
    pub completed_at: i64,
    pub source: ResultSource,
}

/// Agent id -> completion history, in completion order.
pub type Outputs = BTreeMap<String, Vec<CompletionRecord>>;

/// Everything an agent may read while acting.
#[derive(Debug, Clone, Copy)]
pub struct AgentContext<'a> {
    pub plan: &'a Plan,
    pub task: &'a Task,
    /// Histories of agents that have already run in this pipeline.
    pub outputs: &'a Outputs,
    pub run: RunClock,
}

impl<'a> AgentContext<'a> {
    /// Whether `agent_id` has completed at least one task so far.
    pub fn has_output_from(&self, agent_id: &str) -> bool {
        self.outputs.get(agent_id).is_some_and(|h| !h.is_empty())
    }

    /// Agent ids that precede this context's task in plan order.
    pub fn preceding_agents(&self) -> Vec<&'a str> {
        self.plan
            .tasks
            .iter()
            .take_while(|t| t.id != self.task.id)
            .map(|t| t.agent_id.as_str())
            .collect()
    }
}
