//! Shared fakes for swarm integration tests.
//!
//! - Sinks that record, or stop accepting after a fixed number of events.
//! - Generators that always fail or answer from a script, counting calls.
//! - Orchestrator builders wired to a fixed clock and zero pacing.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use swarm_core::generation::CompletionRequest;
use swarm_core::{
    AgentRoster, EventSink, FixedClock, FsProjectStore, GenerationError, Generator, Orchestrator,
    OrchestratorConfig, PipelineEvent, ProjectStore, SinkClosed,
};

/// Start time every test orchestrator reports.
pub const TEST_START_MS: i64 = 1_700_000_000_000;

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Records every event it is sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The `type` tag of each recorded event, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind.name())
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, event: PipelineEvent) -> Result<(), SinkClosed> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Accepts the first `capacity` events, then reports closed on every send.
#[derive(Debug)]
pub struct ClosingSink {
    capacity: usize,
    accepted: Mutex<Vec<PipelineEvent>>,
    attempts: AtomicUsize,
}

impl ClosingSink {
    pub fn after(capacity: usize) -> Self {
        Self {
            capacity,
            accepted: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn accepted(&self) -> Vec<PipelineEvent> {
        self.accepted.lock().unwrap().clone()
    }

    /// Total `send` calls, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for ClosingSink {
    async fn send(&self, event: PipelineEvent) -> Result<(), SinkClosed> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut accepted = self.accepted.lock().unwrap();
        if accepted.len() >= self.capacity {
            return Err(SinkClosed);
        }
        accepted.push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Claims to be usable but fails every request with a transport error.
#[derive(Debug, Default)]
pub struct FailingGenerator {
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    fn is_usable(&self) -> bool {
        true
    }

    async fn request_structured_completion(
        &self,
        _request: &CompletionRequest,
    ) -> Result<Map<String, Value>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Transport("connection refused".to_string()))
    }
}

type Script =
    Box<dyn Fn(&CompletionRequest) -> Result<Map<String, Value>, GenerationError> + Send + Sync>;

/// Answers each request with a caller-supplied function and keeps every
/// request it saw.
pub struct ScriptedGenerator {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(
        script: impl Fn(&CompletionRequest) -> Result<Map<String, Value>, GenerationError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `payload`.
    pub fn always(payload: Map<String, Value>) -> Self {
        Self::new(move |_| Ok(payload.clone()))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn is_usable(&self) -> bool {
        true
    }

    async fn request_structured_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<Map<String, Value>, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(request)
    }
}

/// A well-formed completion payload writing one file.
pub fn completion_payload(summary: &str, path: &str, content: &str) -> Map<String, Value> {
    match json!({
        "summary": summary,
        "message": format!("{summary} done."),
        "files": { path: content },
        "references": []
    }) {
        Value::Object(map) => map,
        _ => unreachable!("json! object literal"),
    }
}

// ---------------------------------------------------------------------------
// Orchestrators
// ---------------------------------------------------------------------------

/// Standard roster over `generator`, writing under `root`, fixed clock,
/// no pacing.
pub fn orchestrator_with(generator: Arc<dyn Generator>, root: &Path) -> Orchestrator {
    orchestrator_with_store(generator, Arc::new(FsProjectStore::new(root)))
}

pub fn orchestrator_with_store(
    generator: Arc<dyn Generator>,
    store: Arc<dyn ProjectStore>,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(AgentRoster::standard(generator)),
        store,
        Arc::new(FixedClock::from_millis(TEST_START_MS)),
        OrchestratorConfig {
            pacing: Duration::ZERO,
        },
    )
}

/// Orchestrator whose generator always fails, forcing synthesis.
pub fn offline_orchestrator(root: &Path) -> Orchestrator {
    orchestrator_with(Arc::new(FailingGenerator::new()), root)
}
