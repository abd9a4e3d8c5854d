//! Agent roster -- the ordered, id-keyed collection of specialists.
//!
//! Registration order is plan order: the plan builder creates one task per
//! agent in the order they were registered, and the orchestrator looks each
//! agent up by id when it dispatches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::generation::Generator;

use super::specialists::{
    AccessibilityAgent, ArchitectureAgent, ComponentAgent, PerformanceAgent, ResponsiveAgent,
    StylingAgent,
};
use super::trait_def::Agent;

/// An ordered collection of [`Agent`] implementations, keyed by id.
///
/// # Example
///
/// ```ignore
/// let roster = AgentRoster::standard(generator);
/// let agent = roster.get("styling").unwrap();
/// ```
#[derive(Default)]
pub struct AgentRoster {
    agents: Vec<Box<dyn Agent>>,
    index: HashMap<&'static str, usize>,
}

impl AgentRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// The six specialists in their fixed order, all sharing `generator`.
    pub fn standard(generator: Arc<dyn Generator>) -> Self {
        let mut roster = Self::new();
        roster.register(ArchitectureAgent::new(Arc::clone(&generator)));
        roster.register(ComponentAgent::new(Arc::clone(&generator)));
        roster.register(StylingAgent::new(Arc::clone(&generator)));
        roster.register(AccessibilityAgent::new(Arc::clone(&generator)));
        roster.register(ResponsiveAgent::new(Arc::clone(&generator)));
        roster.register(PerformanceAgent::new(generator));
        roster
    }

    /// Register an agent under its profile id.
    ///
    /// A new id is appended to the end of the order. If the id is already
    /// registered, the agent is replaced in place and the old one returned.
    pub fn register(&mut self, agent: impl Agent + 'static) -> Option<Box<dyn Agent>> {
        let id = agent.profile().id;
        let boxed: Box<dyn Agent> = Box::new(agent);
        match self.index.get(id) {
            Some(&slot) => Some(std::mem::replace(&mut self.agents[slot], boxed)),
            None => {
                self.index.insert(id, self.agents.len());
                self.agents.push(boxed);
                None
            }
        }
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Option<&dyn Agent> {
        self.index.get(id).map(|&slot| self.agents[slot].as_ref())
    }

    /// Agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Agent> {
        self.agents.iter().map(|a| a.as_ref())
    }

    /// Agent ids in registration order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.iter().map(|a| a.profile().id).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRoster")
            .field("agents", &self.ids())
            .finish()
    }
}
