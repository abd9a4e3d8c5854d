//! Pipeline events and the sink they are delivered to.
//!
//! Every event carries the emitting agent's identity, a human-readable
//! `content` line, and an epoch-millisecond `timestamp`. The variant-specific
//! payload is flattened next to them under a `type` tag, so the wire shape is
//! one flat camelCase JSON object per event.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::{AgentProfile, Outputs};
use crate::materialize::Project;
use crate::plan::{Plan, Task};

/// Identity used for events the orchestrator emits on its own behalf.
pub const ORCHESTRATOR: AgentProfile = AgentProfile {
    id: "orchestrator",
    name: "Swarm Orchestrator",
    specialization: "Coordinator",
};

/// One observable step of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    pub agent_id: String,
    pub agent_name: String,
    pub specialization: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Started,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetails {
    pub summary: String,
    pub files: Vec<String>,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetails {
    pub plan_id: Uuid,
    pub goal_count: usize,
    pub completed_tasks: usize,
    pub contributions: Outputs,
}

/// Variant payloads. Serialized as `type` plus the variant's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Plan {
        plan: Plan,
    },
    #[serde(rename_all = "camelCase")]
    Status {
        status: TaskStatus,
        task_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Message {
        task_id: String,
        details: MessageDetails,
        references: Vec<String>,
    },
    Summary {
        details: SummaryDetails,
    },
    Project {
        project: Project,
    },
    Error {},
}

impl EventKind {
    /// The wire `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plan { .. } => "plan",
            Self::Status { .. } => "status",
            Self::Message { .. } => "message",
            Self::Summary { .. } => "summary",
            Self::Project { .. } => "project",
            Self::Error {} => "error",
        }
    }
}

impl PipelineEvent {
    fn from_profile(profile: &AgentProfile, content: String, timestamp: i64, kind: EventKind) -> Self {
        Self {
            agent_id: profile.id.to_string(),
            agent_name: profile.name.to_string(),
            specialization: profile.specialization.to_string(),
            content,
            timestamp,
            kind,
        }
    }

    pub fn plan(plan: &Plan, timestamp: i64) -> Self {
        Self::from_profile(
            &ORCHESTRATOR,
            format!("Created work plan for {}.", plan.project_name),
            timestamp,
            EventKind::Plan { plan: plan.clone() },
        )
    }

    pub fn started(agent: &AgentProfile, task: &Task, timestamp: i64) -> Self {
        Self::from_profile(
            agent,
            format!("{} picked up task \"{}\".", agent.name, task.title),
            timestamp,
            EventKind::Status {
                status: TaskStatus::Started,
                task_id: task.id.clone(),
            },
        )
    }

    /// `message` falls back to "<name> completed <title>." when blank.
    pub fn message(
        agent: &AgentProfile,
        task: &Task,
        message: &str,
        details: MessageDetails,
        timestamp: i64,
    ) -> Self {
        let content = if message.trim().is_empty() {
            format!("{} completed {}.", agent.name, task.title)
        } else {
            message.to_string()
        };
        let references = details.references.clone();
        Self::from_profile(
            agent,
            content,
            timestamp,
            EventKind::Message {
                task_id: task.id.clone(),
                details,
                references,
            },
        )
    }

    pub fn completed(agent: &AgentProfile, task: &Task, timestamp: i64) -> Self {
        Self::from_profile(
            agent,
            format!(
                "{} completed their {} deliverable.",
                agent.name,
                agent.specialization.to_lowercase()
            ),
            timestamp,
            EventKind::Status {
                status: TaskStatus::Completed,
                task_id: task.id.clone(),
            },
        )
    }

    pub fn summary(plan: &Plan, contributions: Outputs, timestamp: i64) -> Self {
        Self::from_profile(
            &ORCHESTRATOR,
            format!(
                "All {} tasks completed for {}.",
                plan.tasks.len(),
                plan.project_name
            ),
            timestamp,
            EventKind::Summary {
                details: SummaryDetails {
                    plan_id: plan.id,
                    goal_count: plan.goals.len(),
                    completed_tasks: plan.tasks.len(),
                    contributions,
                },
            },
        )
    }

    pub fn project(project: &Project, timestamp: i64) -> Self {
        Self::from_profile(
            &ORCHESTRATOR,
            format!("Project bundle for {} is ready.", project.name),
            timestamp,
            EventKind::Project {
                project: project.clone(),
            },
        )
    }

    pub fn error(reason: impl std::fmt::Display, timestamp: i64) -> Self {
        Self::from_profile(
            &ORCHESTRATOR,
            format!("Failed to write project files: {reason}"),
            timestamp,
            EventKind::Error {},
        )
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// The consumer went away; no further events can be delivered.
#[derive(Debug, Clone, Copy, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Where a run delivers its events. Each `send` is awaited before the run
/// proceeds, so a slow sink applies backpressure.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: PipelineEvent) -> Result<(), SinkClosed>;
}

/// Sink backed by a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }

    /// A sink and the receiving end of a channel with `capacity` slots.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&self, event: PipelineEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}
