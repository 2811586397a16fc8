//! Transcription service

use std::sync::Arc;
use std::time::Instant;

use pastport_core::{SpeechToText, DEFAULT_AUDIO_MIME};

use crate::AgentError;

/// Whole-file transcription over an optional STT backend
#[derive(Clone)]
pub struct TranscriptionService {
    backend: Option<Arc<dyn SpeechToText>>,
    default_mime_type: String,
}

impl TranscriptionService {
    pub fn new(backend: Option<Arc<dyn SpeechToText>>) -> Self {
        Self {
            backend,
            default_mime_type: DEFAULT_AUDIO_MIME.to_string(),
        }
    }

    pub fn with_default_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.default_mime_type = mime.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model_name())
    }

    /// Transcribe one recording; `""` when it contains no speech
    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: Option<&str>,
    ) -> Result<String, AgentError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            AgentError::TranscriptionUnavailable("speech-to-text is not configured".to_string())
        })?;

        let mime = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_mime_type);

        let start = Instant::now();
        let result = backend.transcribe(audio, mime).await;
        metrics::histogram!("pastport_stt_latency_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(text) => {
                let text = text.trim().to_string();
                tracing::debug!(bytes = audio.len(), mime, chars = text.len(), "Transcribed audio");
                Ok(text)
            }
            Err(e) => {
                tracing::error!(model = %backend.model_name(), error = %e, "Transcription failed");
                Err(AgentError::TranscriptionUnavailable(e.to_string()))
            }
        }
    }
}
