//! Pipeline orchestrator: runs every task of a plan in order, then writes
//! the merged files to disk.
//!
//! Tasks run strictly sequentially. Each agent sees the completion records
//! of every agent before it, and file maps merge with last-writer-wins.
//! Every event is awaited on the sink before the run proceeds. If the sink
//! fails once it is detached and the run finishes silently: the project is
//! still materialized.

pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::{AgentContext, AgentRoster, CompletionRecord, Outputs};
use crate::clock::{Clock, RunClock};
use crate::events::{EventSink, MessageDetails, PipelineEvent};
use crate::materialize::{MaterializeError, Project, ProjectStore};
use crate::plan::{Plan, create_plan};

pub use state::RunState;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay after each task's `completed` event.
    pub pacing: Duration,
}

impl OrchestratorConfig {
    pub const DEFAULT_PACING_MS: u64 = 150;
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(Self::DEFAULT_PACING_MS),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub plan: Plan,
    pub project: Project,
    pub outputs: Outputs,
}

/// Drives plan -> tasks -> materialization for one prompt at a time.
///
/// Cheap to share: hold it in an `Arc` and call [`Orchestrator::run`] from as
/// many tasks as needed. Runs share no mutable state.
pub struct Orchestrator {
    roster: Arc<AgentRoster>,
    store: Arc<dyn ProjectStore>,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("roster", &self.roster)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        roster: Arc<AgentRoster>,
        store: Arc<dyn ProjectStore>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            roster,
            store,
            clock,
            config,
        }
    }

    /// Build the plan for `prompt` without running it.
    pub fn plan(&self, prompt: &str) -> Plan {
        create_plan(prompt, &self.roster)
    }

    /// Run the full pipeline for `prompt`, delivering events to `sink`.
    ///
    /// Returns an error only when materialization fails; in that case an
    /// `error` event has been emitted and no `project` event follows.
    pub async fn run(&self, prompt: &str, sink: &dyn EventSink) -> Result<RunOutcome, PipelineError> {
        let run = RunClock::capture(self.clock.as_ref());
        let mut tracker = state::RunTracker::new();
        let mut emitter = Emitter::new(sink);

        let plan = self.plan(prompt);
        tracker.set_plan(plan.id);
        info!(
            plan_id = %plan.id,
            project = %plan.project_name,
            tasks = plan.tasks.len(),
            "pipeline started"
        );
        emitter
            .emit(PipelineEvent::plan(&plan, self.clock.now_ms()))
            .await;

        let mut outputs = Outputs::new();
        let mut files: BTreeMap<String, String> = BTreeMap::new();

        for (task_index, task) in plan.tasks.iter().enumerate() {
            tracker.advance(RunState::Running { task_index });

            let Some(agent) = self.roster.get(&task.agent_id) else {
                warn!(
                    plan_id = %plan.id,
                    task_id = %task.id,
                    agent_id = %task.agent_id,
                    "no agent registered for task, skipping"
                );
                continue;
            };
            let profile = *agent.profile();

            emitter
                .emit(PipelineEvent::started(&profile, task, self.clock.now_ms()))
                .await;

            let ctx = AgentContext {
                plan: &plan,
                task,
                outputs: &outputs,
                run,
            };
            let preceding = ctx.preceding_agents();
            let result = agent.act(&ctx).await;

            for reference in &result.references {
                if !preceding.contains(&reference.as_str()) {
                    debug!(
                        plan_id = %plan.id,
                        agent_id = profile.id,
                        reference = %reference,
                        "reference to an agent that has not run yet"
                    );
                }
            }

            let completed_at = self.clock.now_ms();
            let touched: Vec<String> = result.files.keys().cloned().collect();
            outputs
                .entry(profile.id.to_string())
                .or_default()
                .push(CompletionRecord {
                    task_id: task.id.clone(),
                    summary: result.summary.clone(),
                    message: result.message.clone(),
                    files: touched.clone(),
                    references: result.references.clone(),
                    completed_at,
                    source: result.source,
                });

            for (path, content) in result.files {
                if files.insert(path.clone(), content).is_some() {
                    debug!(agent_id = profile.id, path = %path, "file overwritten by later agent");
                }
            }

            info!(
                plan_id = %plan.id,
                agent_id = profile.id,
                task_id = %task.id,
                files = touched.len(),
                source = ?result.source,
                "task completed"
            );

            emitter
                .emit(PipelineEvent::message(
                    &profile,
                    task,
                    &result.message,
                    MessageDetails {
                        summary: result.summary,
                        files: touched,
                        references: result.references,
                    },
                    completed_at,
                ))
                .await;
            emitter
                .emit(PipelineEvent::completed(&profile, task, self.clock.now_ms()))
                .await;

            if !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        tracker.advance(RunState::Materializing);
        let directory = match self.store.materialize(&plan.slug, &files, run).await {
            Ok(directory) => directory,
            Err(e) => {
                tracker.advance(RunState::Failed);
                warn!(plan_id = %plan.id, error = %e, "materialization failed");
                emitter
                    .emit(PipelineEvent::error(&e, self.clock.now_ms()))
                    .await;
                return Err(e.into());
            }
        };

        let project = Project {
            name: plan.project_name.clone(),
            slug: plan.slug.clone(),
            prompt: plan.prompt.clone(),
            generated_at: self.clock.now(),
            files,
            tasks: plan.tasks.clone(),
            directory,
        };
        tracker.advance(RunState::Completed);

        emitter
            .emit(PipelineEvent::summary(&plan, outputs.clone(), self.clock.now_ms()))
            .await;
        emitter
            .emit(PipelineEvent::project(&project, self.clock.now_ms()))
            .await;

        info!(
            plan_id = %plan.id,
            directory = %project.directory.display(),
            files = project.files.len(),
            state = %tracker.state(),
            sink_detached = emitter.detached,
            "pipeline completed"
        );

        Ok(RunOutcome {
            plan,
            project,
            outputs,
        })
    }
}

/// Wraps a sink; the first failed send detaches it for the rest of the run.
struct Emitter<'a> {
    sink: &'a dyn EventSink,
    detached: bool,
}

impl<'a> Emitter<'a> {
    fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            sink,
            detached: false,
        }
    }

    async fn emit(&mut self, event: PipelineEvent) {
        if self.detached {
            return;
        }
        let kind = event.kind.name();
        if let Err(e) = self.sink.send(event).await {
            warn!(event = kind, error = %e, "event sink failed, detaching");
            self.detached = true;
        }
    }
}
