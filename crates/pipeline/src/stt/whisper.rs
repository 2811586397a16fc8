//! OpenAI Whisper transcription

use std::time::Duration;

use async_trait::async_trait;
use pastport_core::{Error, Result, SpeechToText};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::PipelineError;

const DEFAULT_MODEL: &str = "whisper-1";

/// Multipart upload to `/audio/transcriptions`
pub struct WhisperStt {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl WhisperStt {
    pub fn new(
        api_key: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> std::result::Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Stt(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Upload file name; the API infers the container from the extension
fn upload_name(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or_default().trim() {
        "audio/webm" | "video/webm" => "audio.webm",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "audio.wav",
        "audio/ogg" => "audio.ogg",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "audio.m4a",
        "audio/flac" => "audio.flac",
        _ => "audio.mp3",
    }
}

#[async_trait]
impl SpeechToText for WhisperStt {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        let file = Part::bytes(audio.to_vec())
            .file_name(upload_name(mime_type))
            .mime_str(mime_type)
            .map_err(|e| Error::Stt(format!("invalid mime type '{}': {}", mime_type, e)))?;

        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.endpoint))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("HTTP {}: {}", status, body)));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("invalid transcription response: {}", e)))?;

        Ok(parsed.text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
