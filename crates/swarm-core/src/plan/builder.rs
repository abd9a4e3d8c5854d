//! Plan builder: a pure, total function from a raw prompt to a [`Plan`].
//!
//! Everything except the plan `id` is a deterministic function of the prompt
//! and the roster, so the same prompt always yields the same name, slug,
//! goals, and task titles.

use uuid::Uuid;

use crate::agent::{Agent, AgentRoster};

use super::types::{Plan, PlanOutline, Task, TaskSpec};

/// Prompt recorded on the plan when the caller supplies none.
pub const DEFAULT_PROMPT: &str = "Create a modern, multi-surface frontend experience.";

/// Text the project name is derived from when the prompt is empty.
pub const DEFAULT_NAME_SOURCE: &str = "Swarm collaboration dashboard";

/// Used when nothing alphanumeric survives name cleaning.
pub const DEFAULT_PROJECT_NAME: &str = "Swarm Collaboration Dashboard";

pub const DEFAULT_SLUG: &str = "swarm-project";

pub const DEFAULT_GOALS: [&str; 3] = [
    "Deliver the requested experience end-to-end",
    "Design components that reflect the project vision",
    "Document implementation guidance for future work",
];

const MAX_NAME_WORDS: usize = 6;
const MAX_GOALS: usize = 4;

/// Derive a plan from `raw_prompt`, with one task per agent in `roster`
/// order. Never fails.
pub fn create_plan(raw_prompt: &str, roster: &AgentRoster) -> Plan {
    let prompt = raw_prompt.trim();
    let name_source = if prompt.is_empty() {
        DEFAULT_NAME_SOURCE
    } else {
        prompt
    };
    let name = project_name(name_source);

    let outline = PlanOutline {
        id: Uuid::new_v4(),
        prompt: if prompt.is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            prompt.to_string()
        },
        slug: slugify(&name),
        project_name: name,
        goals: extract_goals(prompt),
    };

    let tasks: Vec<Task> = roster
        .iter()
        .map(|agent| build_task(agent, &outline))
        .collect();

    tracing::debug!(
        plan_id = %outline.id,
        project = %outline.project_name,
        goals = outline.goals.len(),
        tasks = tasks.len(),
        "plan created"
    );

    Plan {
        id: outline.id,
        prompt: outline.prompt,
        project_name: outline.project_name,
        slug: outline.slug,
        goals: outline.goals,
        tasks,
    }
}

fn build_task(agent: &dyn Agent, outline: &PlanOutline) -> Task {
    let profile = agent.profile();
    let spec = agent
        .create_task(outline)
        .unwrap_or_else(|| generic_task(agent, outline));

    Task {
        id: spec.id,
        title: spec.title,
        description: spec.description,
        agent_id: profile.id.to_string(),
        agent_name: profile.name.to_string(),
        specialization: profile.specialization.to_string(),
    }
}

/// Task for agents that do not customise their own.
fn generic_task(agent: &dyn Agent, outline: &PlanOutline) -> TaskSpec {
    let profile = agent.profile();
    let area = profile.specialization.to_lowercase();
    TaskSpec {
        id: format!("{}-task", profile.id),
        title: format!("Contribute {area} expertise"),
        description: format!("Provide {area} deliverables for {}.", outline.project_name),
    }
}

/// Title-cased project name from the first six words of `source`.
///
/// Anything that is not an ASCII letter, digit, or whitespace is treated as a
/// word break.
pub fn project_name(source: &str) -> String {
    let cleaned: String = source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let name = cleaned
        .split_whitespace()
        .take(MAX_NAME_WORDS)
        .map(capitalise)
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    }
}

/// Lower-case, hyphen-separated `[a-z0-9]` slug. Never empty, never starts
/// or ends with a hyphen.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut gap = false;

    for c in value.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(c);
        } else {
            gap = true;
        }
    }

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// Up to four goals, one per sentence of the prompt.
pub fn extract_goals(prompt: &str) -> Vec<String> {
    let condensed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");

    let goals: Vec<String> = condensed
        .split(['.', '?', '!'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .take(MAX_GOALS)
        .map(capitalise)
        .collect();

    if goals.is_empty() {
        DEFAULT_GOALS.iter().map(|g| g.to_string()).collect()
    } else {
        goals
    }
}

fn capitalise(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
