//! LLM integration
//!
//! Features:
//! - Multiple backend support (Gemini `generateContent`, OpenAI chat completions)
//! - Provider-neutral conversation construction with system prompt fusion
//! - Factory selecting a backend from configuration

pub mod backend;
pub mod factory;
pub mod gemini;
pub mod prompt;

pub use backend::{
    FinishReason, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig, MAX_OUTPUT_TOKENS,
    TEMPERATURE,
};
pub use factory::{LlmFactory, LlmProvider, LlmProviderConfig};
pub use gemini::{GeminiBackend, GeminiClient};
pub use prompt::{build_conversation, fuse_system_instruction, ChatMessage, ChatRole};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for pastport_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => pastport_core::Error::NotConfigured(msg),
            other => pastport_core::Error::Llm(other.to_string()),
        }
    }
}
