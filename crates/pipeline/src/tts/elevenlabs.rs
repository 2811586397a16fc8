//! ElevenLabs text-to-speech

use async_trait::async_trait;
use pastport_core::{Error, Result, SpeechProvider};
use reqwest::Client;
use serde::Serialize;

use crate::non_empty;

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// `POST {base}/text-to-speech/{voice_id}`, returns MP3 bytes
pub struct ElevenLabsTts {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model_id: String,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsTts {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsTts {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn is_configured(&self) -> bool {
        non_empty(&self.api_key).is_some()
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let api_key = non_empty(&self.api_key)
            .ok_or_else(|| Error::NotConfigured("ElevenLabs API key".to_string()))?;

        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice))
            .header(XI_API_KEY_HEADER, api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await
            .map_err(|e| Error::Tts(format!("elevenlabs: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = super::error_body(response).await;
            return Err(Error::Tts(format!("elevenlabs HTTP {}: {}", status, body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(format!("elevenlabs: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
