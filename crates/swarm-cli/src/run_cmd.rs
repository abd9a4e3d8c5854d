use std::io::Write;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;

use swarm_core::{EventSink, Orchestrator, PipelineEvent, SinkClosed};

/// How `swarm run` prints events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One `[agent] content` line per event.
    #[default]
    Text,
    /// One JSON object per line, same shape as the SSE `data:` frames.
    Json,
}

/// Writes each event to `out` as it arrives. A write error (e.g. a closed
/// pipe) closes the sink.
pub struct WriterSink<W> {
    out: Mutex<W>,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Render one event in `format`, without a trailing newline.
pub fn render(event: &PipelineEvent, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(event).unwrap_or_default(),
        OutputFormat::Text => format!("[{}] {}", event.agent_name, event.content),
    }
}

#[async_trait]
impl<W: Write + Send> EventSink for WriterSink<W> {
    async fn send(&self, event: PipelineEvent) -> Result<(), SinkClosed> {
        let line = render(&event, self.format);
        let mut out = self.out.lock().map_err(|_| SinkClosed)?;
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|_| SinkClosed)
    }
}

/// Execute `swarm run`: stream events to stdout and report the project
/// directory.
pub async fn run_pipeline(orchestrator: &Orchestrator, prompt: &str, format: OutputFormat) -> Result<()> {
    let sink = WriterSink::new(std::io::stdout(), format);
    let outcome = orchestrator
        .run(prompt, &sink)
        .await
        .context("pipeline failed")?;

    if format == OutputFormat::Text {
        println!();
        println!("Project written to {}", outcome.project.directory.display());
        println!("  files: {}", outcome.project.files.len());
    }
    Ok(())
}
