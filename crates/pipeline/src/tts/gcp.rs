//! Google Cloud Text-to-Speech (REST, API key)

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use pastport_core::{Error, Result, SpeechProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::non_empty;

/// `POST {base}/text:synthesize`, MP3 returned as base64 `audioContent`
pub struct GoogleCloudTts {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    language_code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

impl GoogleCloudTts {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://texttospeech.googleapis.com/v1".to_string(),
            language_code: "en-US".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_language_code(mut self, language_code: &str) -> Self {
        self.language_code = language_code.to_string();
        self
    }

    fn request<'a>(&'a self, text: &'a str, voice: &'a str) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        }
    }
}

#[async_trait]
impl SpeechProvider for GoogleCloudTts {
    fn name(&self) -> &'static str {
        "gcp"
    }

    fn is_configured(&self) -> bool {
        non_empty(&self.api_key).is_some()
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let api_key = non_empty(&self.api_key)
            .ok_or_else(|| Error::NotConfigured("GCP TTS API key".to_string()))?;

        let response = self
            .client
            .post(format!("{}/text:synthesize", self.base_url))
            .header("x-goog-api-key", api_key)
            .json(&self.request(text, voice))
            .send()
            .await
            .map_err(|e| Error::Tts(format!("gcp: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = super::error_body(response).await;
            return Err(Error::Tts(format!("gcp HTTP {}: {}", status, body)));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Tts(format!("gcp: malformed response: {}", e)))?;

        let content = parsed
            .audio_content
            .ok_or_else(|| Error::Tts("gcp: response has no audioContent".to_string()))?;

        BASE64_STANDARD
            .decode(content.as_bytes())
            .map_err(|e| Error::Tts(format!("gcp: invalid base64 audio: {}", e)))
    }
}
