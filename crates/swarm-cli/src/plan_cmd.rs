use anyhow::{Context, Result};

use swarm_core::{AgentRoster, Plan, create_plan};

/// Build the plan for `prompt` over `roster`.
pub fn build_plan(roster: &AgentRoster, prompt: &str) -> Plan {
    let plan = create_plan(prompt, roster);
    tracing::debug!(plan_id = %plan.id, slug = %plan.slug, "plan built");
    plan
}

/// Execute `swarm plan`: print the plan as pretty JSON.
pub fn run_plan(roster: &AgentRoster, prompt: &str) -> Result<()> {
    let plan = build_plan(roster, prompt);
    let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
    println!("{json}");
    Ok(())
}
