//! Gemini `generateContent` REST client and backend
//!
//! [`GeminiClient`] owns the HTTP details and wire types and is shared with
//! the transcription backend, which sends inline audio through the same
//! endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::backend::{FinishReason, GenerationResult, LlmBackend, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::prompt::{ChatMessage, ChatRole};
use crate::LlmError;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Low-level Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    /// Point at a different API root (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send one `generateContent` request
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse Gemini response: {e}")))
    }
}

/// Gemini as an [`LlmBackend`]
#[derive(Debug)]
pub struct GeminiBackend {
    client: GeminiClient,
}

impl GeminiBackend {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();

        let request = GenerateContentRequest {
            contents: messages.iter().map(Content::from).collect(),
            generation_config: Some(GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            }),
        };

        let response = self.client.generate_content(&request).await?;
        let finish_reason = response.finish_reason();
        let text = response.text();

        if finish_reason == FinishReason::Blocked {
            tracing::warn!(model = %self.client.model(), "Gemini withheld the completion");
        }

        Ok(GenerationResult {
            tokens: response
                .usage_metadata
                .and_then(|u| u.candidates_token_count)
                .unwrap_or(0),
            text,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}

/// Request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: usize,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        Content {
            role: match message.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            },
            parts: vec![Part::text(&message.text)],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Base64-encode `bytes` as inline media
    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: BASE64_STANDARD.encode(bytes),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub candidates_token_count: Option<usize>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate; empty when absent
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> FinishReason {
        if self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return FinishReason::Blocked;
        }

        match self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" | "RECITATION") => {
                FinishReason::Blocked
            }
            Some(_) => FinishReason::Other,
        }
    }
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn map_http_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    LlmError::Api(format!("HTTP {}: {}", status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiClient::new("  ", DEFAULT_MODEL, Duration::from_secs(1)),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_url_shape() {
        let client = GeminiClient::new("k", "gemini-test", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            client.url(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![
                Content::from(&ChatMessage::user("hi")),
                Content::from(&ChatMessage::model("hello")),
                Content {
                    role: "user",
                    parts: vec![Part::text("transcribe"), Part::inline("audio/webm", b"abc")],
                },
            ],
            generation_config: Some(GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 300,
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][2]["parts"][1]["inlineData"]["mimeType"], "audio/webm");
        assert_eq!(json["contents"][2]["parts"][1]["inlineData"]["data"], "YWJj");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 300);
    }

    #[test]
    fn test_response_text_and_reasons() {
        let ok: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.text(), "Hello there");
        assert_eq!(ok.finish_reason(), FinishReason::Stop);

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.text(), "");
        assert_eq!(blocked.finish_reason(), FinishReason::Blocked);

        let safety: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(safety.finish_reason(), FinishReason::Blocked);
    }

    #[test]
    fn test_http_error_message() {
        let err = map_http_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "API error: HTTP 403: PERMISSION_DENIED: API key not valid"
        );
    }
}
