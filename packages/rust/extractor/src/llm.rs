//! Structured-generation capability and its OpenRouter implementation.
//!
//! The extractor only sees [`StructuredGenerator`]; API keys and HTTP clients
//! live inside whichever implementation the caller injects.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use prospector_shared::{AppConfig, ProspectorError, Result};

// ---------------------------------------------------------------------------
// Capability types
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One entry of the message list sent to the model.
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

/// A named JSON Schema the response must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

/// Produces one JSON payload for a message list under a schema constraint.
#[async_trait::async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate_structured(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<serde_json::Value>;
}

// ---------------------------------------------------------------------------
// OpenRouter (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaSpec<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Structured generator backed by the OpenRouter chat completions API.
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// Create a client for `base_url` (e.g. `https://openrouter.ai/api/v1`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build from the `[openrouter]` config section, reading the key from the environment.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = prospector_shared::api_key(config)?;
        Self::new(
            &config.openrouter.base_url,
            api_key,
            config.openrouter.model.clone(),
            Duration::from_secs(config.openrouter.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl StructuredGenerator for OpenRouterClient {
    #[instrument(skip_all, fields(model = %self.model, schema = %schema.name))]
    async fn generate_structured(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<serde_json::Value> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaSpec {
                    name: &schema.name,
                    strict: true,
                    schema: &schema.schema,
                },
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProspectorError::Network(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProspectorError::Extraction(format!(
                "provider returned HTTP {status}: {}",
                snippet(&body)
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProspectorError::Extraction(format!("invalid completion body: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProspectorError::Extraction("no content in completion".into()))?;

        debug!(len = content.len(), "completion received");

        serde_json::from_str(content.trim()).map_err(|e| {
            ProspectorError::Extraction(format!(
                "completion is not valid JSON: {e} (got: {})",
                snippet(&content)
            ))
        })
    }
}

/// First 200 characters of a provider payload, for error messages.
fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}
