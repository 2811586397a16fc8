//! Error types shared across crates

use thiserror::Error;

/// Core error type
///
/// Crate-level errors (`LlmError`, `SttError`, `TtsError`, ...) convert into
/// this type at crate boundaries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Persona not found: {0}")]
    PersonaNotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Audio storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
