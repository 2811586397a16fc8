//! Configuration management for the persona voice backend
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (`PASTPORT__` prefix, `__` separator)
//! - Conventional provider env vars (`GEMINI_API_KEY`, `OPENAI_API_KEY`, ...)
//! - `ALLOW_ORIGINS` for the CORS allow-list
//!
//! Personas are loaded separately from `personas.path` into a
//! [`PersonaRegistry`].

pub mod personas;
pub mod settings;

pub use personas::PersonaRegistry;
pub use settings::{
    load_settings, load_settings_from, HistoryConfig, LlmConfig, ObservabilityConfig, PersonasConfig,
    ProvidersConfig, RuntimeEnvironment, SafetyConfig, ServerConfig, Settings, SttConfig,
    TtsConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for pastport_core::Error {
    fn from(err: ConfigError) -> Self {
        pastport_core::Error::Config(err.to_string())
    }
}
