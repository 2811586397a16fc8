//! Response generation service

use std::sync::Arc;
use std::time::Instant;

use pastport_core::{Persona, Turn};
use pastport_llm::{build_conversation, LlmBackend};

use crate::{AgentError, APOLOGY_MESSAGE};

/// Persona reply generation over an optional LLM backend
///
/// A missing backend (no credentials at startup) makes every call fail with
/// `ServiceUnavailable`, same as an unreachable provider.
#[derive(Clone)]
pub struct ResponseGenerator {
    backend: Option<Arc<dyn LlmBackend>>,
}

impl ResponseGenerator {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { backend }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model_name())
    }

    /// Generate the persona's reply to `message` given prior turns
    pub async fn generate(
        &self,
        persona: &Persona,
        message: &str,
        history: &[Turn],
    ) -> Result<String, AgentError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            AgentError::ServiceUnavailable("language model is not configured".to_string())
        })?;

        let messages = build_conversation(&persona.system_prompt, history, message);
        let start = Instant::now();
        let result = backend.generate(&messages).await;
        metrics::histogram!("pastport_llm_latency_seconds").record(start.elapsed().as_secs_f64());

        let result = result.map_err(|e| {
            tracing::error!(persona = %persona.id, model = %backend.model_name(), error = %e, "LLM generation failed");
            AgentError::ServiceUnavailable(e.to_string())
        })?;

        if result.is_empty() {
            tracing::warn!(
                persona = %persona.id,
                finish_reason = ?result.finish_reason,
                "LLM returned no usable text"
            );
            return Ok(APOLOGY_MESSAGE.to_string());
        }

        tracing::debug!(
            persona = %persona.id,
            tokens = result.tokens,
            total_ms = result.total_time_ms,
            "Generated reply"
        );
        Ok(result.text.trim().to_string())
    }
}
