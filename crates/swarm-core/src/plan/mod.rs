//! Plan derivation: project identity, goals, and one task per roster agent.

pub mod builder;
pub mod types;

pub use builder::{
    DEFAULT_GOALS, DEFAULT_NAME_SOURCE, DEFAULT_PROJECT_NAME, DEFAULT_PROMPT, DEFAULT_SLUG,
    create_plan, extract_goals, project_name, slugify,
};
pub use types::{Plan, PlanOutline, Task, TaskSpec};
