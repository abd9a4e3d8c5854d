//! Specialist agents and the roster that orders them.
//!
//! Every agent is total: [`Agent::act`] asks the generation service first
//! and falls back to deterministic synthesis, so a run never stalls on a
//! missing credential or a bad response.

pub mod roster;
pub mod specialists;
pub mod strategy;
pub mod trait_def;
pub mod types;

pub use roster::AgentRoster;
pub use specialists::{
    AccessibilityAgent, ArchitectureAgent, ComponentAgent, PerformanceAgent, ResponsiveAgent,
    StylingAgent,
};
pub use trait_def::Agent;
pub use types::{AgentContext, AgentProfile, AgentResult, CompletionRecord, Outputs, ResultSource};
