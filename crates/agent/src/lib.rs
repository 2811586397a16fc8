//! Persona conversation orchestration
//!
//! Features:
//! - Bounded per-session conversation history
//! - Response generation over a pluggable LLM backend
//! - Transcription over a pluggable STT backend
//! - Text-chat, voice-chat and speak flows with a fixed partial-failure
//!   contract (LLM failure is an error, TTS failure only drops the audio)

pub mod generation;
pub mod history;
pub mod orchestrator;
pub mod transcription;

pub use generation::ResponseGenerator;
pub use history::HistoryStore;
pub use orchestrator::{ChatReply, ChatRequest, Orchestrator, ProviderStatus, VoiceReply};
pub use transcription::TranscriptionService;

use thiserror::Error;

/// Reply used when the content filter blocks a message
pub const REFUSAL_MESSAGE: &str = "I cannot help with that request.";

/// Reply used when the model returns nothing usable
pub const APOLOGY_MESSAGE: &str =
    "I apologize, the stream of history is momentarily obscured. Please rephrase your question.";

/// Reply used when a recording yields no transcript
pub const UNINTELLIGIBLE_AUDIO_MESSAGE: &str =
    "Sorry, I could not understand the audio. Please try again.";

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Persona not found: {0}")]
    PersonaNotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl AgentError {
    /// Stable machine-readable kind, used in error bodies and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::PersonaNotFound(_) => "persona_not_found",
            AgentError::ServiceUnavailable(_) => "service_unavailable",
            AgentError::TranscriptionUnavailable(_) => "transcription_unavailable",
            AgentError::InvalidRequest(_) => "invalid_request",
            AgentError::Initialization(_) => "initialization",
        }
    }
}

impl From<AgentError> for pastport_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::PersonaNotFound(id) => pastport_core::Error::PersonaNotFound(id),
            AgentError::ServiceUnavailable(msg) => pastport_core::Error::Llm(msg),
            AgentError::TranscriptionUnavailable(msg) => pastport_core::Error::Stt(msg),
            AgentError::InvalidRequest(msg) => pastport_core::Error::Config(msg),
            AgentError::Initialization(msg) => pastport_core::Error::Config(msg),
        }
    }
}

impl From<pastport_config::ConfigError> for AgentError {
    fn from(err: pastport_config::ConfigError) -> Self {
        AgentError::Initialization(err.to_string())
    }
}

impl From<pastport_pipeline::PipelineError> for AgentError {
    fn from(err: pastport_pipeline::PipelineError) -> Self {
        AgentError::Initialization(err.to_string())
    }
}
