//! LLM Factory
//!
//! Creates an LLM backend from provider configuration.
//!
//! ## Supported Providers
//! - **Gemini**: `generateContent` REST API (default)
//! - **OpenAI**: chat completions, or any compatible server
//!
//! ## Example
//! ```ignore
//! let config = LlmProviderConfig::gemini(api_key);
//! let llm = LlmFactory::create(&config)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{LlmBackend, OpenAIBackend, OpenAIConfig};
use crate::gemini::{self, GeminiBackend, GeminiClient};
use crate::LlmError;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "openai" | "gpt" => Some(LlmProvider::OpenAI),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => gemini::DEFAULT_MODEL,
            LlmProvider::OpenAI => "gpt-3.5-turbo",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => gemini::DEFAULT_BASE_URL,
            LlmProvider::OpenAI => "https://api.openai.com/v1",
        }
    }
}

/// Unified LLM provider configuration
#[derive(Clone)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmProviderConfig {
    pub fn new(provider: LlmProvider, api_key: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            endpoint: provider.default_endpoint().to_string(),
            model: provider.default_model().to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::new(LlmProvider::Gemini, Some(api_key.into()))
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(LlmProvider::OpenAI, Some(api_key.into()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Factory for creating LLM backends
pub struct LlmFactory;

impl LlmFactory {
    /// Create a backend, failing with `Configuration` when the key is missing
    pub fn create(config: &LlmProviderConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Configuration(format!("{:?} API key not configured", config.provider))
            })?;

        let backend: Arc<dyn LlmBackend> = match config.provider {
            LlmProvider::Gemini => {
                let client = GeminiClient::new(api_key, &config.model, config.timeout)?
                    .with_base_url(&config.endpoint);
                Arc::new(GeminiBackend::new(client))
            }
            LlmProvider::OpenAI => {
                let openai = OpenAIConfig::new(api_key)
                    .with_model(&config.model)
                    .with_endpoint(&config.endpoint)
                    .with_timeout(config.timeout);
                Arc::new(OpenAIBackend::new(openai)?)
            }
        };

        tracing::info!(
            provider = ?config.provider,
            model = %backend.model_name(),
            "Created LLM backend"
        );

        Ok(backend)
    }

    /// Like [`create`](Self::create) but logs and returns `None` on failure
    ///
    /// Used at startup so the server can run with generation disabled.
    pub fn try_create(config: &LlmProviderConfig) -> Option<Arc<dyn LlmBackend>> {
        match Self::create(config) {
            Ok(backend) => Some(backend),
            Err(e) => {
                tracing::warn!(provider = ?config.provider, error = %e, "LLM backend unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(LlmProvider::from_str("Gemini"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::from_str("openai"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_str("ollama"), None);
    }

    #[test]
    fn test_defaults() {
        let config = LlmProviderConfig::gemini("k");
        assert_eq!(config.model, "gemini-2.5-flash-lite");

        let config = LlmProviderConfig::openai("k");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.endpoint, "https://api.openai.com/v1");
    }

    #[test]
    fn test_missing_key() {
        let config = LlmProviderConfig::new(LlmProvider::Gemini, None);
        assert!(matches!(
            LlmFactory::create(&config),
            Err(LlmError::Configuration(_))
        ));
        assert!(LlmFactory::try_create(&config).is_none());

        let config = LlmProviderConfig::new(LlmProvider::OpenAI, Some(String::new()));
        assert!(LlmFactory::create(&config).is_err());
    }

    #[test]
    fn test_create_both() {
        let gemini = LlmFactory::create(&LlmProviderConfig::gemini("k")).unwrap();
        assert_eq!(gemini.model_name(), "gemini-2.5-flash-lite");

        let openai =
            LlmFactory::create(&LlmProviderConfig::openai("k").with_model("gpt-4o-mini")).unwrap();
        assert_eq!(openai.model_name(), "gpt-4o-mini");
    }
}
