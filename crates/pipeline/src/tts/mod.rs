//! Text-to-Speech providers and the fallback chain
//!
//! Each provider is one [`SpeechProvider`](pastport_core::SpeechProvider);
//! [`SpeechSynthesizer`] tries them in configured order and stores the first
//! successful result.

mod chain;
mod elevenlabs;
mod gcp;
mod openai;

pub use chain::SpeechSynthesizer;
pub use elevenlabs::ElevenLabsTts;
pub use gcp::GoogleCloudTts;
pub use openai::OpenAiTts;

use std::sync::Arc;
use std::time::Duration;

use pastport_config::Settings;
use pastport_core::SpeechProvider;
use reqwest::Client;

use crate::PipelineError;

/// Build providers in `tts.provider_order`
///
/// Providers without credentials are still created so the chain can report
/// and skip them.
pub fn create_providers(
    settings: &Settings,
) -> Result<Vec<Arc<dyn SpeechProvider>>, PipelineError> {
    let p = &settings.providers;
    let client = http_client(Duration::from_secs(p.timeout_seconds))?;

    let mut providers: Vec<Arc<dyn SpeechProvider>> = Vec::new();
    for name in &settings.tts.provider_order {
        let provider: Arc<dyn SpeechProvider> = match name.as_str() {
            "elevenlabs" => Arc::new(
                ElevenLabsTts::new(client.clone(), p.elevenlabs_api_key.clone())
                    .with_base_url(&p.elevenlabs_base_url)
                    .with_model(&settings.tts.elevenlabs_model),
            ),
            "gcp" => Arc::new(
                GoogleCloudTts::new(client.clone(), p.gcp_tts_api_key.clone())
                    .with_base_url(&p.gcp_tts_base_url)
                    .with_language_code(&settings.tts.gcp_language_code),
            ),
            "openai" => Arc::new(
                OpenAiTts::new(client.clone(), p.openai_api_key.clone())
                    .with_base_url(&p.openai_base_url)
                    .with_model(&settings.tts.openai_model),
            ),
            other => {
                return Err(PipelineError::NotConfigured(format!(
                    "unknown TTS provider '{}'",
                    other
                )))
            }
        };
        providers.push(provider);
    }

    Ok(providers)
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, PipelineError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Tts(format!("Failed to create HTTP client: {}", e)))
}

/// Read a provider's error body for logging, bounded
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > 512 {
        let mut cut = 512;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_order_follows_config() {
        let mut settings = Settings::default();
        settings.tts.provider_order = vec!["openai".to_string(), "gcp".to_string()];

        let names: Vec<_> = create_providers(&settings)
            .unwrap()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["openai", "gcp"]);
    }

    #[test]
    fn test_unconfigured_without_keys() {
        let mut settings = Settings::default();
        settings.providers.elevenlabs_api_key = None;
        settings.providers.gcp_tts_api_key = Some(String::new());
        settings.providers.openai_api_key = Some("sk".to_string());

        let configured: Vec<_> = create_providers(&settings)
            .unwrap()
            .iter()
            .map(|p| (p.name(), p.is_configured()))
            .collect();
        assert_eq!(
            configured,
            vec![("elevenlabs", false), ("gcp", false), ("openai", true)]
        );
    }
}
