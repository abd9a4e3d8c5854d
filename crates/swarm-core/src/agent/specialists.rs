//! The six roster agents.
//!
//! Each one pairs a role brief for the generation service with a
//! deterministic document set from [`crate::synth`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::generation::Generator;
use crate::plan::{PlanOutline, TaskSpec};
use crate::synth::{self, SynthInput, Synthesis};

use super::trait_def::Agent;
use super::types::{AgentContext, AgentProfile, AgentResult, ResultSource};

fn synthesized(synthesis: Synthesis, references: &[&str]) -> AgentResult {
    AgentResult {
        summary: synthesis.summary,
        message: synthesis.message,
        files: synthesis.files,
        references: references.iter().map(|r| r.to_string()).collect(),
        source: ResultSource::Synthesized,
    }
}

/// Run `f` with the synthesis input for `ctx`.
fn with_input<T>(ctx: &AgentContext<'_>, f: impl FnOnce(&SynthInput<'_>) -> T) -> T {
    let stamp = ctx.run.stamp();
    let input = SynthInput {
        project_name: &ctx.plan.project_name,
        slug: &ctx.plan.slug,
        prompt: &ctx.plan.prompt,
        goals: &ctx.plan.goals,
        stamp: &stamp,
    };
    f(&input)
}

// ---------------------------------------------------------------------------
// Architecture
// ---------------------------------------------------------------------------

pub struct ArchitectureAgent {
    generator: Arc<dyn Generator>,
}

impl ArchitectureAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "architecture",
        name: "Architecture Agent",
        specialization: "Architecture",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for ArchitectureAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Lay out the project skeleton: a package manifest, an HTML entry point, \
the application bootstrap, the folder structure, and where state and \
networking live. Other agents build on your file tree."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn create_task(&self, outline: &PlanOutline) -> Option<TaskSpec> {
        Some(TaskSpec {
            id: "architecture-blueprint".to_string(),
            title: "Design the application architecture".to_string(),
            description: format!(
                "Define the folder layout, state boundaries, and entry points for {}.",
                outline.project_name
            ),
        })
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        synthesized(with_input(ctx, synth::architecture), &[])
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

pub struct ComponentAgent {
    generator: Arc<dyn Generator>,
}

impl ComponentAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "component",
        name: "Component Agent",
        specialization: "Component",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for ComponentAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Write the React component tree on top of the architecture: the root \
App, layout shells, and feature components, each with a clear props \
contract."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn create_task(&self, outline: &PlanOutline) -> Option<TaskSpec> {
        Some(TaskSpec {
            id: "component-library".to_string(),
            title: "Build the component library".to_string(),
            description: format!(
                "Implement the React components that deliver the goals of {}.",
                outline.project_name
            ),
        })
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        let basis = if ctx.has_output_from(ArchitectureAgent::PROFILE.id) {
            "according to the architecture blueprint"
        } else {
            "based on the product prompt"
        };
        let mut result = synthesized(
            with_input(ctx, synth::component),
            &[ArchitectureAgent::PROFILE.id],
        );
        result.message = format!("Proposed React components {basis} and defined their data contracts.");
        result
    }
}

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

pub struct StylingAgent {
    generator: Arc<dyn Generator>,
}

impl StylingAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "styling",
        name: "Styling Agent",
        specialization: "Styling",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for StylingAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Define design tokens as CSS custom properties and document how the \
components consume them."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn create_task(&self, outline: &PlanOutline) -> Option<TaskSpec> {
        Some(TaskSpec {
            id: "styling-tokens".to_string(),
            title: "Establish the visual language".to_string(),
            description: format!(
                "Create color, spacing, and typography tokens for {}.",
                outline.project_name
            ),
        })
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        synthesized(
            with_input(ctx, synth::styling),
            &[ComponentAgent::PROFILE.id],
        )
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

pub struct AccessibilityAgent {
    generator: Arc<dyn Generator>,
}

impl AccessibilityAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "accessibility",
        name: "Accessibility Agent",
        specialization: "Accessibility",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for AccessibilityAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Audit the components and styles against WCAG 2.2 AA and write concrete \
requirements for landmarks, focus order, contrast, and live regions."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn create_task(&self, outline: &PlanOutline) -> Option<TaskSpec> {
        Some(TaskSpec {
            id: "accessibility-review".to_string(),
            title: "Review accessibility".to_string(),
            description: format!(
                "Document the accessibility requirements {} must meet.",
                outline.project_name
            ),
        })
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        synthesized(
            with_input(ctx, synth::accessibility),
            &[ComponentAgent::PROFILE.id, StylingAgent::PROFILE.id],
        )
    }
}

// ---------------------------------------------------------------------------
// Responsive
// ---------------------------------------------------------------------------

pub struct ResponsiveAgent {
    generator: Arc<dyn Generator>,
}

impl ResponsiveAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "responsive",
        name: "Responsive Design Agent",
        specialization: "Responsive Design",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for ResponsiveAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Choose breakpoints and describe how the layout adapts from phones to \
wide desktop screens, with the media queries to match."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn create_task(&self, outline: &PlanOutline) -> Option<TaskSpec> {
        Some(TaskSpec {
            id: "responsive-layouts".to_string(),
            title: "Plan responsive layouts".to_string(),
            description: format!(
                "Adapt {} to mobile, tablet, and desktop viewports.",
                outline.project_name
            ),
        })
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        synthesized(
            with_input(ctx, synth::responsive),
            &[StylingAgent::PROFILE.id],
        )
    }
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// Uses the generic task from the plan builder.
pub struct PerformanceAgent {
    generator: Arc<dyn Generator>,
}

impl PerformanceAgent {
    pub const PROFILE: AgentProfile = AgentProfile {
        id: "performance",
        name: "Performance Agent",
        specialization: "Performance",
    };

    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for PerformanceAgent {
    fn profile(&self) -> &AgentProfile {
        &Self::PROFILE
    }

    fn brief(&self) -> &str {
        "Set a rendering and data-handling budget: memoization, list \
virtualization, and what to move off the main thread."
    }

    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn synthesize(&self, ctx: &AgentContext<'_>) -> AgentResult {
        synthesized(
            with_input(ctx, synth::performance),
            &[ComponentAgent::PROFILE.id, ResponsiveAgent::PROFILE.id],
        )
    }
}
