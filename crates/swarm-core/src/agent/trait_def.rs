//! The `Agent` trait -- one implementation per specialization.
//!
//! Object-safe so the roster can hold `Box<dyn Agent>`.

use async_trait::async_trait;

use crate::generation::Generator;
use crate::plan::{PlanOutline, TaskSpec};

use super::strategy;
use super::types::{AgentContext, AgentProfile, AgentResult};

/// A specialist that turns its task in a plan into an [`AgentResult`].
///
/// Implementors supply identity, a role brief for the generation service,
/// and a deterministic fallback. The provided [`Agent::act`] ties them
/// together: generate when possible, synthesize otherwise. It never fails.
#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    /// Role guidance appended to the system instruction sent to the
    /// generation service.
    fn brief(&self) -> &str;

    /// The generation client this agent delegates to.
    fn generator(&self) -> &dyn Generator;

    /// Build this agent's task from the plan outline. `None` makes the plan
    /// builder use a generic task derived from the specialization.
    fn create_task(&self, _outline: &PlanOutline) -> Option<TaskSpec> {
        None
    }

    /// Deterministic fallback. Must depend only on the plan, the run clock,
    /// and (for message wording) the outputs so far.
    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult;

    /// Produce this agent's result for `ctx`. Total: generation failures
    /// downgrade to [`Agent::synthesize`].
    async fn act(&self, ctx: &AgentContext<'_>) -> AgentResult {
        strategy::act_with_fallback(self, ctx).await
    }
}

// Compile-time assertion: Agent must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Agent) {}
};
