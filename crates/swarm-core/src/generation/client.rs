
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::config::{GenerationConfig, Provider};

/// Why a structured completion could not be obtained.
///
/// Callers in this crate never branch on the variant; it exists for logs.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation unavailable: no API key configured")]
    Unavailable,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("schema error: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Named JSON schema sent as `response_format.json_schema`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchema {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the configured default temperature.
    pub temperature: Option<f32>,
    /// Requests schema-constrained output; plain JSON-object mode otherwise.
    pub schema: Option<JsonSchema>,
}

/// A source of structured (JSON object) completions.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Whether a credential is configured. When false, callers skip the
    /// request entirely.
    fn is_usable(&self) -> bool;

    /// Send `request` and return the decoded JSON object from the first
    /// choice's message content.
    async fn request_structured_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<Map<String, Value>, GenerationError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// [`Generator`] over an OpenAI-compatible (or Azure) chat-completions API.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl std::fmt::Debug for HttpGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerator")
            .field("config", &self.config)
            .finish()
    }
}

impl HttpGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, GenerationError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::Unavailable)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let (name, value) = match self.config.provider {
            Provider::OpenAi => (AUTHORIZATION, format!("Bearer {key}")),
            Provider::Azure => (HeaderName::from_static("api-key"), key.to_string()),
        };
        let value =
            HeaderValue::from_str(&value).map_err(|e| GenerationError::Transport(e.to_string()))?;
        headers.insert(name, value);
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat<'a> {
    JsonObject,
    JsonSchema { json_schema: &'a JsonSchema },
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Generator for HttpGenerator {
    fn is_usable(&self) -> bool {
        self.config.is_usable()
    }

    async fn request_structured_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<Map<String, Value>, GenerationError> {
        let headers = self.headers()?;
        let url = self.config.completions_url();

        let body = ChatRequest {
            model: &self.config.model,
            temperature: request
                .temperature
                .filter(|t| t.is_finite())
                .unwrap_or(self.config.temperature),
            messages: &request.messages,
            response_format: match &request.schema {
                Some(json_schema) => ResponseFormat::JsonSchema { json_schema },
                None => ResponseFormat::JsonObject,
            },
        };

        debug!(
            url = %url,
            model = %self.config.model,
            messages = request.messages.len(),
            "requesting structured completion"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerationError::Transport(format!("HTTP {status}: {text}")));
        }

        parse_completion_body(&text)
    }
}

/// Decode a chat-completions response body down to the JSON object carried
/// in `choices[0].message.content`.
fn parse_completion_body(body: &str) -> Result<Map<String, Value>, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Parse(format!("invalid response body: {e}")))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::Parse("response did not include text content".into()))?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| GenerationError::Parse(format!("content is not JSON: {e}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(GenerationError::Schema(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
