//! Speech-to-Text backends
//!
//! Whole-file transcription of a user recording. One call per upload, no
//! streaming and no retry.

mod gemini;
mod whisper;

pub use gemini::{GeminiStt, TRANSCRIBE_INSTRUCTION};
pub use whisper::WhisperStt;

use std::sync::Arc;
use std::time::Duration;

use pastport_config::Settings;
use pastport_core::SpeechToText;

use crate::{non_empty, PipelineError};

/// STT backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SttBackend {
    #[default]
    Gemini,
    Whisper,
}

impl SttBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(SttBackend::Gemini),
            "whisper" | "openai" => Some(SttBackend::Whisper),
            _ => None,
        }
    }
}

/// Build the configured STT backend
///
/// Fails with `NotConfigured` when the backend's credential is missing; the
/// caller decides whether to run without transcription.
pub fn create_stt(settings: &Settings) -> Result<Arc<dyn SpeechToText>, PipelineError> {
    let backend = SttBackend::from_str(&settings.stt.backend).ok_or_else(|| {
        PipelineError::NotConfigured(format!("unknown STT backend '{}'", settings.stt.backend))
    })?;
    let providers = &settings.providers;
    let timeout = Duration::from_secs(providers.timeout_seconds);

    let stt: Arc<dyn SpeechToText> = match backend {
        SttBackend::Gemini => {
            let key = non_empty(&providers.gemini_api_key)
                .ok_or_else(|| PipelineError::NotConfigured("Gemini API key".to_string()))?;
            let model = settings
                .stt
                .model
                .as_deref()
                .unwrap_or(pastport_llm::gemini::DEFAULT_MODEL);
            Arc::new(GeminiStt::new(key, model, timeout, &providers.gemini_base_url)?)
        }
        SttBackend::Whisper => {
            let key = non_empty(&providers.openai_api_key)
                .ok_or_else(|| PipelineError::NotConfigured("OpenAI API key".to_string()))?;
            let mut whisper = WhisperStt::new(key, &providers.openai_base_url, timeout)?;
            if let Some(model) = settings.stt.model.as_deref() {
                whisper = whisper.with_model(model);
            }
            Arc::new(whisper)
        }
    };

    tracing::info!(backend = ?backend, model = %stt.model_name(), "Created STT backend");
    Ok(stt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(SttBackend::from_str("whisper"), Some(SttBackend::Whisper));
        assert_eq!(SttBackend::from_str("GEMINI"), Some(SttBackend::Gemini));
        assert_eq!(SttBackend::from_str("vosk"), None);
    }

    #[test]
    fn test_missing_key_not_configured() {
        let mut settings = Settings::default();
        settings.providers.gemini_api_key = None;
        assert!(matches!(
            create_stt(&settings),
            Err(PipelineError::NotConfigured(_))
        ));

        settings.providers.gemini_api_key = Some("k".to_string());
        assert!(create_stt(&settings).is_ok());
    }

    #[test]
    fn test_whisper_selected() {
        let mut settings = Settings::default();
        settings.stt.backend = "whisper".to_string();
        settings.providers.openai_api_key = Some("sk".to_string());
        let stt = create_stt(&settings).unwrap();
        assert_eq!(stt.model_name(), "whisper-1");
    }
}
