//! Ordered TTS fallback chain

use std::sync::Arc;
use std::time::{Duration, Instant};

use pastport_core::{AudioReference, Persona, SpeechProvider};

use crate::audio_store::AudioStore;

/// Tries providers in order and stores the first successful synthesis
///
/// Synthesis is best-effort: every failure is logged and swallowed, and
/// `None` means no provider produced audio. An optional budget bounds the
/// whole chain; running out of it also yields `None`.
pub struct SpeechSynthesizer {
    providers: Vec<Arc<dyn SpeechProvider>>,
    store: AudioStore,
    budget: Option<Duration>,
}

impl SpeechSynthesizer {
    pub fn new(providers: Vec<Arc<dyn SpeechProvider>>, store: AudioStore) -> Self {
        Self {
            providers,
            store,
            budget: None,
        }
    }

    /// Bound the total time spent across the provider chain
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    /// Provider names in chain order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Names of providers that have credentials
    pub fn configured_providers(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    pub fn has_configured_provider(&self) -> bool {
        self.providers.iter().any(|p| p.is_configured())
    }

    /// Speak `text` in the persona's voice
    pub async fn synthesize(&self, persona: &Persona, text: &str) -> Option<AudioReference> {
        if text.trim().is_empty() {
            return None;
        }

        let Some(budget) = self.budget else {
            return self.run_chain(persona, text).await;
        };

        match tokio::time::timeout(budget, self.run_chain(persona, text)).await {
            Ok(audio) => audio,
            Err(_) => {
                tracing::warn!(
                    persona = %persona.id,
                    budget_ms = budget.as_millis() as u64,
                    "TTS budget exhausted, replying without audio"
                );
                metrics::counter!("pastport_tts_timeouts_total").increment(1);
                None
            }
        }
    }

    async fn run_chain(&self, persona: &Persona, text: &str) -> Option<AudioReference> {
        for provider in &self.providers {
            let name = provider.name();

            if !provider.is_configured() {
                tracing::debug!(provider = name, "TTS provider not configured, skipping");
                continue;
            }

            let start = Instant::now();
            let result = provider.synthesize(text, &persona.voice_selector).await;
            metrics::histogram!("pastport_tts_latency_seconds", "provider" => name)
                .record(start.elapsed().as_secs_f64());

            let bytes = match result {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    tracing::warn!(provider = name, persona = %persona.id, "TTS provider returned no audio");
                    metrics::counter!("pastport_tts_fallbacks_total", "provider" => name)
                        .increment(1);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(provider = name, persona = %persona.id, error = %e, "TTS provider failed");
                    metrics::counter!("pastport_tts_fallbacks_total", "provider" => name)
                        .increment(1);
                    continue;
                }
            };

            match self
                .store
                .save(&persona.id, provider.file_extension(), &bytes)
                .await
            {
                Ok(audio) => {
                    tracing::info!(
                        provider = name,
                        persona = %persona.id,
                        file = %audio.filename,
                        bytes = bytes.len(),
                        "Synthesized reply audio"
                    );
                    return Some(audio);
                }
                Err(e) => {
                    tracing::error!(provider = name, error = %e, "Failed to store synthesized audio");
                    return None;
                }
            }
        }

        tracing::warn!(persona = %persona.id, "No TTS provider produced audio");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pastport_core::{Error, Result};
    use parking_lot::Mutex;

    struct FakeProvider {
        name: &'static str,
        configured: bool,
        outcome: Option<Vec<u8>>,
        delay: Option<Duration>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeProvider {
        fn new(name: &'static str, configured: bool, outcome: Option<&[u8]>) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured,
                outcome: outcome.map(|b| b.to_vec()),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn slow(name: &'static str, delay: Duration, outcome: Option<&[u8]>) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: true,
                outcome: outcome.map(|b| b.to_vec()),
                delay: Some(delay),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl SpeechProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
            self.calls.lock().push((text.to_string(), voice.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome
                .clone()
                .ok_or_else(|| Error::Tts(format!("{} down", self.name)))
        }
    }

    fn build(providers: &[&Arc<FakeProvider>], dir: &std::path::Path) -> SpeechSynthesizer {
        let providers = providers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn SpeechProvider>)
            .collect();
        SpeechSynthesizer::new(providers, AudioStore::new(dir, "/api/audio"))
    }

    fn persona() -> Persona {
        Persona::new("einstein", "Albert Einstein", "prompt", "voice-main")
    }

    #[tokio::test]
    async fn test_first_failure_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::new("elevenlabs", true, None);
        let b = FakeProvider::new("gcp", true, Some(b"MP3"));
        let c = FakeProvider::new("openai", true, Some(b"never"));
        let synth = build(&[&a, &b, &c], dir.path());

        let audio = synth.synthesize(&persona(), "Hello").await.unwrap();

        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 0);
        assert_eq!(
            std::fs::read(dir.path().join(&audio.filename)).unwrap(),
            b"MP3"
        );
        assert_eq!(b.calls.lock()[0].1, "voice-main");
        assert_eq!(a.calls.lock()[0].1, "voice-main");
    }

    #[tokio::test]
    async fn test_unconfigured_skipped_without_call() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::new("elevenlabs", false, Some(b"x"));
        let b = FakeProvider::new("openai", true, Some(b"y"));
        let synth = build(&[&a, &b], dir.path());

        assert!(synth.synthesize(&persona(), "Hi").await.is_some());
        assert_eq!(a.call_count(), 0);
        assert_eq!(synth.configured_providers(), vec!["openai"]);
    }

    #[tokio::test]
    async fn test_all_failing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::new("elevenlabs", true, None);
        let b = FakeProvider::new("gcp", true, Some(b""));
        let synth = build(&[&a, &b], dir.path());

        assert!(synth.synthesize(&persona(), "Hi").await.is_none());
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_skips_providers() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::new("openai", true, Some(b"x"));
        let synth = build(&[&a], dir.path());

        assert!(synth.synthesize(&persona(), "   ").await.is_none());
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn test_budget_bounds_slow_chain() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::slow("elevenlabs", Duration::from_secs(5), Some(b"late"));
        let b = FakeProvider::new("openai", true, Some(b"never"));
        let synth = build(&[&a, &b], dir.path()).with_budget(Duration::from_millis(100));

        let start = Instant::now();
        assert!(synth.synthesize(&persona(), "Hello").await.is_none());
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_budget_allows_fast_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeProvider::slow("elevenlabs", Duration::from_millis(10), None);
        let b = FakeProvider::new("openai", true, Some(b"MP3"));
        let synth = build(&[&a, &b], dir.path()).with_budget(Duration::from_secs(5));

        assert_eq!(synth.budget(), Some(Duration::from_secs(5)));
        assert!(synth.synthesize(&persona(), "Hello").await.is_some());
        assert_eq!(b.call_count(), 1);
    }
}
