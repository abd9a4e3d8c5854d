mod config;
mod plan_cmd;
mod run_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use swarm_core::generation::{GenerationConfig, Generator, HttpGenerator, Provider};
use swarm_core::{AgentRoster, FsProjectStore, Orchestrator, OrchestratorConfig, SystemClock};

use config::{CliOverrides, SwarmConfig};
use run_cmd::OutputFormat;

#[derive(Parser)]
#[command(name = "swarm", about = "Multi-agent project generator streaming every step")]
struct Cli {
    /// Generation provider: openai or azure (overrides AI_PROVIDER env var)
    #[arg(long, global = true)]
    provider: Option<Provider>,

    /// Model name (overrides OPENAI_MODEL / AI_MODEL env vars)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory projects are written under (overrides SWARM_PROJECTS_DIR env var)
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a swarm config file
    Init {
        /// API key for the generation service (omit to run in fallback mode)
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the plan a prompt would produce, as JSON
    Plan {
        /// Free-text project prompt
        #[arg(default_value = "")]
        prompt: String,
    },
    /// Run the full pipeline and write the project to disk
    Run {
        /// Free-text project prompt
        #[arg(default_value = "")]
        prompt: String,
        /// Event output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Delay after each task in milliseconds
        #[arg(long, default_value_t = OrchestratorConfig::DEFAULT_PACING_MS)]
        pacing_ms: u64,
    },
    /// Serve the SSE stream endpoint
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            provider: self.provider,
            model: self.model.clone(),
            projects_dir: self.projects_dir.clone(),
        }
    }
}

/// Execute the `swarm init` command: write config file.
fn cmd_init(cli: &Cli, api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let provider = cli.provider.unwrap_or_default();
    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| GenerationConfig::DEFAULT_MODEL.to_string());
    let projects_dir = cli
        .projects_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PROJECTS_DIR));

    let cfg = config::ConfigFile {
        generation: config::GenerationSection {
            provider: Some(provider.to_string()),
            api_key: api_key.map(str::to_string),
            model: Some(model.clone()),
            ..Default::default()
        },
        projects: config::ProjectsSection {
            dir: Some(projects_dir.clone()),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  generation.provider = {provider}");
    println!("  generation.model = {model}");
    println!(
        "  generation.api_key = {}",
        if api_key.is_some() { "(set)" } else { "(unset, fallback mode)" }
    );
    println!("  projects.dir = {}", projects_dir.display());

    Ok(())
}

fn build_generator(resolved: &SwarmConfig) -> anyhow::Result<Arc<dyn Generator>> {
    let generator = HttpGenerator::new(resolved.generation.clone())
        .context("failed to build generation client")?;
    if generator.is_usable() {
        tracing::info!(
            provider = %resolved.generation.provider,
            model = %resolved.generation.model,
            "generation service configured"
        );
    } else {
        tracing::info!("no API key configured, agents will use fallback synthesis");
    }
    Ok(Arc::new(generator))
}

fn build_orchestrator(resolved: &SwarmConfig, pacing: Duration) -> anyhow::Result<Orchestrator> {
    let generator = build_generator(resolved)?;
    Ok(Orchestrator::new(
        Arc::new(AgentRoster::standard(generator)),
        Arc::new(FsProjectStore::new(&resolved.projects_dir)),
        Arc::new(SystemClock),
        OrchestratorConfig { pacing },
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `swarm run --format json` keeps stdout clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { api_key, force } => {
            cmd_init(&cli, api_key.as_deref(), *force)?;
        }
        Commands::Plan { prompt } => {
            let resolved = SwarmConfig::resolve(&cli.overrides())?;
            let roster = AgentRoster::standard(build_generator(&resolved)?);
            plan_cmd::run_plan(&roster, prompt)?;
        }
        Commands::Run {
            prompt,
            format,
            pacing_ms,
        } => {
            let resolved = SwarmConfig::resolve(&cli.overrides())?;
            let orchestrator = build_orchestrator(&resolved, Duration::from_millis(*pacing_ms))?;
            run_cmd::run_pipeline(&orchestrator, prompt, *format).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = SwarmConfig::resolve(&cli.overrides())?;
            let orchestrator = build_orchestrator(
                &resolved,
                Duration::from_millis(OrchestratorConfig::DEFAULT_PACING_MS),
            )?;
            serve_cmd::run_serve(Arc::new(orchestrator), bind, *port).await?;
        }
    }

    Ok(())
}
