//! LLM backend trait and the OpenAI-compatible backend

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::{ChatMessage, ChatRole};
use crate::LlmError;

/// Sampling temperature used for every persona reply
pub const TEMPERATURE: f32 = 0.7;

/// Output cap used for every persona reply
pub const MAX_OUTPUT_TOKENS: usize = 300;

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text, possibly empty
    pub text: String,
    /// Tokens generated, when reported
    pub tokens: usize,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

impl GenerationResult {
    /// True when the provider produced nothing usable
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() || self.finish_reason == FinishReason::Blocked
    }
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    /// Withheld by the provider's own safety system
    Blocked,
    Other,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response
    ///
    /// An empty or blocked completion is returned as `Ok` with
    /// [`GenerationResult::is_empty`] set; transport, auth and non-2xx
    /// failures are errors.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult, LlmError>;

    /// Check if model is available
    async fn is_available(&self) -> bool {
        true
    }

    /// Get model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible backend configuration
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API endpoint (`https://api.openai.com/v1` or a compatible server)
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI chat completions backend
///
/// Works with OpenAI and servers exposing the same `/chat/completions` API.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !config.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();

        let request = OpenAIChatRequest {
            model: &self.config.model,
            messages: openai_messages(messages),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        let tokens = response.usage.map(|u| u.completion_tokens).unwrap_or(0);

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(GenerationResult {
                text: String::new(),
                tokens,
                total_time_ms,
                finish_reason: FinishReason::Other,
            });
        };

        Ok(GenerationResult {
            text: choice.message.content.unwrap_or_default(),
            tokens,
            total_time_ms,
            finish_reason: match choice.finish_reason.as_deref() {
                Some("stop") | None => FinishReason::Stop,
                Some("length") => FinishReason::Length,
                Some("content_filter") => FinishReason::Blocked,
                Some(_) => FinishReason::Other,
            },
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn openai_messages(messages: &[ChatMessage]) -> Vec<OpenAIMessage<'_>> {
    messages
        .iter()
        .map(|m| OpenAIMessage {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Model => "assistant",
            },
            content: &m.text,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OpenAIConfig::default();
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 300);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        assert!(matches!(
            OpenAIBackend::new(OpenAIConfig::default()),
            Err(LlmError::Configuration(_))
        ));
        assert!(OpenAIBackend::new(OpenAIConfig::new("sk-test")).is_ok());
    }

    #[test]
    fn test_chat_url() {
        let backend =
            OpenAIBackend::new(OpenAIConfig::new("k").with_endpoint("https://api.example.com/v1/"))
                .unwrap();
        assert_eq!(backend.chat_url(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_request_role_mapping() {
        let messages = [ChatMessage::user("hi"), ChatMessage::model("hello")];
        let request = OpenAIChatRequest {
            model: "m",
            messages: openai_messages(&messages),
            max_tokens: 300,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn test_blocked_is_empty() {
        let result = GenerationResult {
            text: "partial".to_string(),
            tokens: 1,
            total_time_ms: 1,
            finish_reason: FinishReason::Blocked,
        };
        assert!(result.is_empty());
    }
}
