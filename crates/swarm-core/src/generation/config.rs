use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which wire dialect the completion service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    #[default]
    OpenAi,
    /// Azure OpenAI deployments (`api-key` header, versioned URL).
    Azure,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Azure => f.write_str("azure"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            other => Err(format!("unknown provider {other:?} (expected openai or azure)")),
        }
    }
}

/// Azure-only settings. Unset fields fall back to the base URL and model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSettings {
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: None,
            api_version: GenerationConfig::DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }
}

/// Immutable generation settings, resolved once at process start.
///
/// Without an API key the client reports itself unusable and every agent
/// runs in fallback mode.
#[derive(Clone, PartialEq)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    pub azure: AzureSettings,
}

impl GenerationConfig {
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

    /// A config with every default and no credential.
    pub fn disabled() -> Self {
        Self {
            provider: Provider::OpenAi,
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            azure: AzureSettings::default(),
        }
    }

    /// Defaults plus an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::disabled()
        }
    }

    /// True iff a non-blank credential is configured.
    pub fn is_usable(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Full URL of the chat-completions endpoint for the configured provider.
    pub fn completions_url(&self) -> String {
        match self.provider {
            Provider::OpenAi => {
                format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
            }
            Provider::Azure => {
                let endpoint = self
                    .azure
                    .endpoint
                    .as_deref()
                    .unwrap_or(&self.base_url)
                    .trim_end_matches('/');
                let deployment = self.azure.deployment.as_deref().unwrap_or(&self.model);
                format!(
                    "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={}",
                    self.azure.api_version
                )
            }
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

// The API key never reaches logs.
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("azure", &self.azure)
            .finish()
    }
}
