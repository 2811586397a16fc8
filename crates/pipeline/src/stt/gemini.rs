//! Gemini multimodal transcription

use std::time::Duration;

use async_trait::async_trait;
use pastport_core::{Error, Result, SpeechToText};
use pastport_llm::gemini::{Content, GenerateContentRequest, GeminiClient, Part};

use crate::PipelineError;

/// Instruction sent alongside the inline audio
pub const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the speech found in the audio file into text.";

/// Transcription through `generateContent` with inline audio
#[derive(Debug)]
pub struct GeminiStt {
    client: GeminiClient,
}

impl GeminiStt {
    pub fn new(
        api_key: &str,
        model: &str,
        timeout: Duration,
        base_url: &str,
    ) -> std::result::Result<Self, PipelineError> {
        let client = GeminiClient::new(api_key, model, timeout)
            .map_err(|e| PipelineError::NotConfigured(e.to_string()))?
            .with_base_url(base_url);
        Ok(Self { client })
    }
}

#[async_trait]
impl SpeechToText for GeminiStt {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part::text(TRANSCRIBE_INSTRUCTION), Part::inline(mime_type, audio)],
            }],
            generation_config: None,
        };

        let response = self
            .client
            .generate_content(&request)
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        Ok(response.text().trim().to_string())
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}
