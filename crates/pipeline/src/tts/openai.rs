//! OpenAI text-to-speech

use async_trait::async_trait;
use pastport_core::{Error, Result, SpeechProvider};
use reqwest::Client;
use serde::Serialize;

use crate::non_empty;

/// `POST {base}/audio/speech`, returns MP3 bytes
pub struct OpenAiTts {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

impl OpenAiTts {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "tts-1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl SpeechProvider for OpenAiTts {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        non_empty(&self.api_key).is_some()
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let api_key = non_empty(&self.api_key)
            .ok_or_else(|| Error::NotConfigured("OpenAI API key".to_string()))?;

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(api_key)
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice,
                response_format: "mp3",
            })
            .send()
            .await
            .map_err(|e| Error::Tts(format!("openai: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = super::error_body(response).await;
            return Err(Error::Tts(format!("openai HTTP {}: {}", status, body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(format!("openai: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
