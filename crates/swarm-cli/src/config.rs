//! Configuration file management for swarm.
//!
//! Provides a TOML-based config file at `~/.config/swarm/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use swarm_core::generation::{AzureSettings, GenerationConfig, Provider};

/// Projects root used when nothing else is configured.
pub const DEFAULT_PROJECTS_DIR: &str = "./projects";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub projects: ProjectsSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    /// `openai` or `azure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSection>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AzureSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProjectsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the swarm config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/swarm` or `~/.config/swarm`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("swarm");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("swarm")
}

/// Return the path to the swarm config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. Each one beats every other source.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub projects_dir: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SwarmConfig {
    pub generation: GenerationConfig,
    pub projects_dir: PathBuf,
}

/// First set, non-blank environment variable among `keys`.
fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl SwarmConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - provider: `--provider` > `AI_PROVIDER` > `generation.provider` > openai
    /// - api key: `OPENAI_API_KEY` > `AI_API_KEY` > `generation.api_key` > none
    /// - base url: `OPENAI_BASE_URL` > `AI_BASE_URL` > `generation.base_url` > OpenAI
    /// - model: `--model` > `OPENAI_MODEL` > `AI_MODEL` > `generation.model` > `gpt-4o-mini`
    /// - temperature: `OPENAI_TEMPERATURE` > `AI_TEMPERATURE` > `generation.temperature` > 0.2
    /// - timeout: `SWARM_REQUEST_TIMEOUT_SECS` > `generation.timeout_secs` > 60
    /// - azure: `AZURE_OPENAI_{ENDPOINT,DEPLOYMENT,API_VERSION}` > `generation.azure.*`
    /// - projects dir: `--projects-dir` > `SWARM_PROJECTS_DIR` > `projects.dir` > `./projects`
    pub fn resolve(overrides: &CliOverrides) -> Result<Self> {
        let file_config = load_config().ok();
        Self::resolve_with(overrides, file_config.as_ref())
    }

    fn resolve_with(overrides: &CliOverrides, file: Option<&ConfigFile>) -> Result<Self> {
        let section = file.map(|f| &f.generation);
        let azure_section = section.and_then(|s| s.azure.as_ref());

        let provider = match overrides.provider {
            Some(p) => p,
            None => match env_first(&["AI_PROVIDER"]).or_else(|| section.and_then(|s| s.provider.clone())) {
                Some(raw) => raw
                    .parse::<Provider>()
                    .map_err(|e| anyhow!(e))
                    .context("invalid generation provider")?,
                None => Provider::default(),
            },
        };

        let api_key = env_first(&["OPENAI_API_KEY", "AI_API_KEY"])
            .or_else(|| section.and_then(|s| s.api_key.clone()));

        let base_url = env_first(&["OPENAI_BASE_URL", "AI_BASE_URL"])
            .or_else(|| section.and_then(|s| s.base_url.clone()))
            .unwrap_or_else(|| GenerationConfig::DEFAULT_BASE_URL.to_string());

        let model = overrides
            .model
            .clone()
            .or_else(|| env_first(&["OPENAI_MODEL", "AI_MODEL"]))
            .or_else(|| section.and_then(|s| s.model.clone()))
            .unwrap_or_else(|| GenerationConfig::DEFAULT_MODEL.to_string());

        let temperature = match env_first(&["OPENAI_TEMPERATURE", "AI_TEMPERATURE"]) {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite())
                .with_context(|| format!("temperature {raw:?} is not a number"))?,
            None => section
                .and_then(|s| s.temperature)
                .unwrap_or(GenerationConfig::DEFAULT_TEMPERATURE),
        };

        let timeout_secs = match env_first(&["SWARM_REQUEST_TIMEOUT_SECS"]) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("SWARM_REQUEST_TIMEOUT_SECS {raw:?} is not a whole number"))?,
            None => section
                .and_then(|s| s.timeout_secs)
                .unwrap_or(GenerationConfig::DEFAULT_TIMEOUT_SECS),
        };

        let azure = AzureSettings {
            endpoint: env_first(&["AZURE_OPENAI_ENDPOINT"])
                .or_else(|| azure_section.and_then(|a| a.endpoint.clone())),
            deployment: env_first(&["AZURE_OPENAI_DEPLOYMENT"])
                .or_else(|| azure_section.and_then(|a| a.deployment.clone())),
            api_version: env_first(&["AZURE_OPENAI_API_VERSION"])
                .or_else(|| azure_section.and_then(|a| a.api_version.clone()))
                .unwrap_or_else(|| GenerationConfig::DEFAULT_AZURE_API_VERSION.to_string()),
        };

        let projects_dir = overrides
            .projects_dir
            .clone()
            .or_else(|| env_first(&["SWARM_PROJECTS_DIR"]).map(PathBuf::from))
            .or_else(|| file.and_then(|f| f.projects.dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_DIR));

        Ok(Self {
            generation: GenerationConfig {
                provider,
                api_key,
                base_url,
                model,
                temperature,
                timeout: Duration::from_secs(timeout_secs),
                azure,
            },
            projects_dir,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
