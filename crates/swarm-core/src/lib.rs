//! Core of the swarm pipeline: turns one free-text prompt into a plan, runs a
//! fixed roster of specialist agents over it in order, streams a typed event
//! for every transition, and writes the merged file set to disk.
//!
//! ```text
//! prompt --> plan::create_plan --> Plan
//!                                   |
//!              Orchestrator::run ---+--> AgentRoster (fixed order)
//!                   |                        |
//!                   |                 Agent::act -> Generator (HTTP)
//!                   |                        \--> synth (fallback)
//!                   v
//!              EventSink  <-- PipelineEvent per transition
//!                   |
//!              ProjectStore::materialize --> Project
//! ```

pub mod agent;
pub mod clock;
pub mod events;
pub mod generation;
pub mod materialize;
pub mod orchestrator;
pub mod plan;
pub mod synth;

pub use agent::{Agent, AgentContext, AgentProfile, AgentResult, AgentRoster, CompletionRecord, Outputs, ResultSource};
pub use clock::{Clock, FixedClock, RunClock, SystemClock};
pub use events::{ChannelSink, EventKind, EventSink, PipelineEvent, SinkClosed};
pub use generation::{GenerationConfig, GenerationError, Generator, HttpGenerator, Provider};
pub use materialize::{FsProjectStore, MaterializeError, Project, ProjectStore};
pub use orchestrator::{Orchestrator, OrchestratorConfig, PipelineError, RunOutcome, RunState};
pub use plan::{Plan, Task, create_plan};
