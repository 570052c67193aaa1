//! Chat-completions clients for hosted and local language models.

use std::time::Duration;

use async_trait::async_trait;
use partdesk_core::config::ModelEndpointConfig;
use serde::Deserialize;
use tracing::debug;

use crate::error::LlmError;
use crate::outcome::ExternalOutcome;

/// System prompt sent with every completion request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant specialised in appliance parts.";

/// A language model that turns a prompt into text.
///
/// Implementations never return errors: a missing credential or a
/// timeout is [`ExternalOutcome::Unavailable`], a bad answer is
/// [`ExternalOutcome::Failed`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short name used in agent tags and logs.
    fn label(&self) -> &str;

    /// Whether a call could possibly succeed (enabled, credential present).
    fn is_configured(&self) -> bool;

    /// Complete `prompt` under the given system prompt.
    async fn complete(&self, system: &str, prompt: &str) -> ExternalOutcome<String>;
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatModelClient {
    config: ModelEndpointConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ChatModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModelClient")
            .field("label", &self.config.label)
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

impl ChatModelClient {
    /// Build a client from an endpoint section. The API key is read from
    /// the environment once, here.
    pub fn from_config(config: &ModelEndpointConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ClientBuild(e.to_string()))?;

        Ok(Self {
            config: config.clone(),
            api_key: config.resolve_api_key(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn call_api(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured(self.config.label.clone()));
        }

        let body = serde_json::json!({
            "model": &self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature
        });

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let text = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&text)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for ChatModelClient {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn is_configured(&self) -> bool {
        self.config.is_callable_with(self.api_key.as_deref())
    }

    async fn complete(&self, system: &str, prompt: &str) -> ExternalOutcome<String> {
        let result = self.call_api(system, prompt).await;
        match &result {
            Ok(text) => debug!(model = %self.config.label, chars = text.len(), "Completion received"),
            Err(LlmError::NotConfigured(_)) => {
                debug!(model = %self.config.label, "Model not configured, skipping")
            }
            Err(e) => debug!(model = %self.config.label, error = %e, "Completion failed"),
        }
        result.into()
    }
}
