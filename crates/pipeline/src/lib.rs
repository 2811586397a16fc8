//! Speech pipeline
//!
//! This crate provides the speech side of a persona exchange:
//! - Speech-to-Text backends (Gemini multimodal, OpenAI Whisper)
//! - Text-to-Speech providers (ElevenLabs, GCP Cloud TTS, OpenAI) behind an
//!   ordered fallback chain
//! - The audio store that persists synthesized files and serves them back

pub mod audio_store;
pub mod stt;
pub mod tts;

pub use audio_store::{content_type_for, AudioStore};
pub use stt::{create_stt, GeminiStt, SttBackend, WhisperStt};
pub use tts::{
    create_providers, ElevenLabsTts, GoogleCloudTts, OpenAiTts, SpeechSynthesizer,
};

use thiserror::Error;

/// A credential that is present and not blank
pub(crate) fn non_empty(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Audio storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for pastport_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stt(msg) => pastport_core::Error::Stt(msg),
            PipelineError::Tts(msg) => pastport_core::Error::Tts(msg),
            PipelineError::NotConfigured(msg) => pastport_core::Error::NotConfigured(msg),
            PipelineError::Storage(msg) => pastport_core::Error::Storage(msg),
            PipelineError::Io(e) => pastport_core::Error::Io(e),
        }
    }
}
