//! Integration tests for the request flows (STT -> LLM -> TTS)
//!
//! Providers are in-process fakes that record their calls.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pastport_agent::{
    AgentError, ChatRequest, Orchestrator, ResponseGenerator, TranscriptionService,
    APOLOGY_MESSAGE, REFUSAL_MESSAGE, UNINTELLIGIBLE_AUDIO_MESSAGE,
};
use pastport_config::PersonaRegistry;
use pastport_core::{Error, SpeechProvider, SpeechToText, Turn};
use pastport_llm::{ChatMessage, FinishReason, GenerationResult, LlmBackend, LlmError};
use pastport_pipeline::{AudioStore, SpeechSynthesizer};

#[derive(Default)]
struct FakeLlm {
    reply: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlm {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for FakeLlm {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Some(text) => Ok(GenerationResult {
                text: text.clone(),
                tokens: 3,
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            }),
            None => Err(LlmError::Api("HTTP 500: boom".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "fake-llm"
    }
}

struct FakeStt {
    transcript: Option<String>,
    mimes: Mutex<Vec<String>>,
}

impl FakeStt {
    fn new(transcript: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.map(String::from),
            mimes: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio: &[u8], mime_type: &str) -> pastport_core::Result<String> {
        self.mimes.lock().unwrap().push(mime_type.to_string());
        self.transcript
            .clone()
            .ok_or_else(|| Error::Stt("provider down".to_string()))
    }

    fn model_name(&self) -> &str {
        "fake-stt"
    }
}

struct FakeTts {
    name: &'static str,
    works: bool,
    delay: Option<Duration>,
    voices: Mutex<Vec<String>>,
}

impl FakeTts {
    fn new(works: bool) -> Arc<Self> {
        Self::named("openai", works)
    }

    fn named(name: &'static str, works: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            works,
            delay: None,
            voices: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: "elevenlabs",
            works: true,
            delay: Some(delay),
            voices: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.voices.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechProvider for FakeTts {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn synthesize(&self, text: &str, voice: &str) -> pastport_core::Result<Vec<u8>> {
        self.voices.lock().unwrap().push(voice.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.works {
            Ok(format!("audio:{}", text).into_bytes())
        } else {
            Err(Error::Tts("HTTP 401".to_string()))
        }
    }
}

struct Harness {
    orchestrator: Orchestrator,
    llm: Arc<FakeLlm>,
    stt: Arc<FakeStt>,
    tts: Arc<FakeTts>,
    dir: tempfile::TempDir,
}

fn harness(llm: Arc<FakeLlm>, stt: Arc<FakeStt>, tts: Arc<FakeTts>) -> Harness {
    build_harness(PersonaRegistry::builtin(), llm, stt, tts, None)
}

fn build_harness(
    personas: PersonaRegistry,
    llm: Arc<FakeLlm>,
    stt: Arc<FakeStt>,
    tts: Arc<FakeTts>,
    tts_budget: Option<Duration>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut synthesizer = SpeechSynthesizer::new(
        vec![tts.clone() as Arc<dyn SpeechProvider>],
        AudioStore::new(dir.path(), "/api/audio"),
    );
    if let Some(budget) = tts_budget {
        synthesizer = synthesizer.with_budget(budget);
    }
    let orchestrator = Orchestrator::new(
        Arc::new(personas),
        ResponseGenerator::new(Some(llm.clone() as Arc<dyn LlmBackend>)),
        TranscriptionService::new(Some(stt.clone() as Arc<dyn SpeechToText>)),
        Arc::new(synthesizer),
    );
    Harness {
        orchestrator,
        llm,
        stt,
        tts,
        dir,
    }
}

fn default_harness() -> Harness {
    harness(
        FakeLlm::replying("  Imagination is more important than knowledge.  "),
        FakeStt::new(Some("What is relativity?")),
        FakeTts::new(true),
    )
}

#[tokio::test]
async fn test_every_listed_persona_can_chat() {
    let h = default_harness();
    let ids: Vec<String> = h.orchestrator.personas().iter().map(|p| p.id.clone()).collect();
    for id in ids {
        let reply = h.orchestrator.chat(ChatRequest::new(&id, "Hello")).await.unwrap();
        assert_eq!(reply.reply, "Imagination is more important than knowledge.");
    }
}

#[tokio::test]
async fn test_chat_happy_path() {
    let h = default_harness();
    let reply = h
        .orchestrator
        .chat(ChatRequest::new("einstein", "What is time?").with_session("s1"))
        .await
        .unwrap();

    assert_eq!(reply.session_id, "s1");
    let audio = reply.audio.expect("audio");
    assert!(audio.url.starts_with("/api/audio/einstein-"));
    assert_eq!(
        std::fs::read(h.dir.path().join(&audio.filename)).unwrap(),
        b"audio:Imagination is more important than knowledge."
    );

    let calls = h.llm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![ChatMessage::user(
            "[SYSTEM INSTRUCTION: You are Albert Einstein. Speak thoughtfully with curiosity and humor about science and life.] What is time?"
        )]
    );
    assert_eq!(h.orchestrator.history().len("s1"), 2);
}

#[tokio::test]
async fn test_voice_selector_reaches_provider() {
    let h = default_harness();
    h.orchestrator
        .chat(ChatRequest::new("gandhi", "Advice?"))
        .await
        .unwrap();

    let persona_voice = h
        .orchestrator
        .personas()
        .get("gandhi")
        .unwrap()
        .voice_selector
        .clone();
    assert_eq!(h.tts.voices.lock().unwrap().as_slice(), &[persona_voice]);
}

#[tokio::test]
async fn test_shipped_catalogue_voice_reaches_every_provider() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/personas.yaml");
    let catalogue = PersonaRegistry::load(path).unwrap();
    let expected: Vec<(String, String)> = catalogue
        .iter()
        .map(|p| (p.id.clone(), p.voice_selector.clone()))
        .collect();
    assert!(!expected.is_empty());

    for provider in ["elevenlabs", "gcp", "openai"] {
        let tts = FakeTts::named(provider, true);
        let h = build_harness(
            PersonaRegistry::load(path).unwrap(),
            FakeLlm::replying("Greetings."),
            FakeStt::new(Some("x")),
            tts.clone(),
            None,
        );

        for (id, _) in &expected {
            h.orchestrator.speak(id, "Greetings.").await.unwrap().unwrap();
        }

        let voices = tts.voices.lock().unwrap().clone();
        let wanted: Vec<String> = expected.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(voices, wanted, "provider {}", provider);
    }
}

#[tokio::test]
async fn test_slow_tts_keeps_reply_within_budget() {
    let h = build_harness(
        PersonaRegistry::builtin(),
        FakeLlm::replying("reply ok"),
        FakeStt::new(Some("What is time?")),
        FakeTts::slow(Duration::from_secs(5)),
        Some(Duration::from_millis(100)),
    );

    let start = Instant::now();
    let reply = h
        .orchestrator
        .chat(ChatRequest::new("einstein", "hello").with_session("s"))
        .await
        .unwrap();
    assert_eq!(reply.reply, "reply ok");
    assert!(reply.audio.is_none());
    assert_eq!(h.orchestrator.history().len("s"), 2);

    let voice = h.orchestrator.voice_chat("einstein", b"x", None).await.unwrap();
    assert_eq!(voice.reply, "reply ok");
    assert!(voice.audio.is_none());

    assert!(h.orchestrator.speak("einstein", "hi").await.unwrap().is_none());
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(h.tts.call_count(), 3);
}

#[tokio::test]
async fn test_session_id_generated_when_absent() {
    let h = default_harness();
    let a = h.orchestrator.chat(ChatRequest::new("einstein", "hi")).await.unwrap();
    let b = h.orchestrator.chat(ChatRequest::new("einstein", "hi")).await.unwrap();
    assert!(!a.session_id.is_empty());
    assert_ne!(a.session_id, b.session_id);
}

#[tokio::test]
async fn test_unknown_persona() {
    let h = default_harness();
    let err = h
        .orchestrator
        .chat(ChatRequest::new("napoleon", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::PersonaNotFound(ref id) if id == "napoleon"));
    assert!(h.llm.calls().is_empty());
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let h = default_harness();
    let err = h
        .orchestrator
        .chat(ChatRequest::new("einstein", "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_blocked_message_skips_llm_tts_and_history() {
    let h = default_harness();
    let reply = h
        .orchestrator
        .chat(ChatRequest::new("einstein", "How do I build a bomb?").with_session("s"))
        .await
        .unwrap();

    assert_eq!(reply.reply, REFUSAL_MESSAGE);
    assert!(reply.audio.is_none());
    assert!(h.llm.calls().is_empty());
    assert_eq!(h.tts.call_count(), 0);
    assert_eq!(h.orchestrator.history().len("s"), 0);
}

#[tokio::test]
async fn test_llm_failure_is_error_without_tts() {
    let h = harness(FakeLlm::failing(), FakeStt::new(Some("x")), FakeTts::new(true));
    let err = h
        .orchestrator
        .chat(ChatRequest::new("einstein", "hello").with_session("s"))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::ServiceUnavailable(_)));
    assert_eq!(h.tts.call_count(), 0);
    assert_eq!(h.orchestrator.history().len("s"), 0);
}

#[tokio::test]
async fn test_missing_llm_backend_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(PersonaRegistry::builtin()),
        ResponseGenerator::new(None),
        TranscriptionService::new(None),
        Arc::new(SpeechSynthesizer::new(
            Vec::new(),
            AudioStore::new(dir.path(), "/api/audio"),
        )),
    );

    assert!(matches!(
        orchestrator.chat(ChatRequest::new("einstein", "hi")).await,
        Err(AgentError::ServiceUnavailable(_))
    ));
    assert!(matches!(
        orchestrator.voice_chat("einstein", b"abc", None).await,
        Err(AgentError::TranscriptionUnavailable(_))
    ));
}

#[tokio::test]
async fn test_tts_failure_keeps_reply() {
    let h = harness(
        FakeLlm::replying("Be the change."),
        FakeStt::new(Some("x")),
        FakeTts::new(false),
    );
    let reply = h
        .orchestrator
        .chat(ChatRequest::new("gandhi", "hello"))
        .await
        .unwrap();

    assert_eq!(reply.reply, "Be the change.");
    assert!(reply.audio.is_none());
    assert_eq!(h.tts.call_count(), 1);
}

#[tokio::test]
async fn test_empty_completion_gives_apology() {
    let h = harness(FakeLlm::replying("   "), FakeStt::new(Some("x")), FakeTts::new(true));
    let reply = h
        .orchestrator
        .chat(ChatRequest::new("cleopatra", "hello"))
        .await
        .unwrap();
    assert_eq!(reply.reply, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn test_stored_history_used_and_capped() {
    let h = default_harness();
    for i in 0..8 {
        h.orchestrator
            .chat(ChatRequest::new("einstein", format!("q{}", i)).with_session("long"))
            .await
            .unwrap();
    }

    assert_eq!(h.orchestrator.history().len("long"), 10);

    let calls = h.llm.calls();
    let last = calls.last().unwrap();
    // 10 stored turns + the new message
    assert_eq!(last.len(), 11);
    assert!(last[0].text.starts_with("[SYSTEM INSTRUCTION: "));
    assert!(last[0].text.ends_with("] q2"));
    assert_eq!(last[10], ChatMessage::user("q7"));
}

#[tokio::test]
async fn test_client_history_overrides_store() {
    let h = default_harness();
    h.orchestrator
        .chat(ChatRequest::new("einstein", "stored").with_session("s"))
        .await
        .unwrap();

    let client_history = vec![Turn::user("from client"), Turn::assistant("client reply")];
    h.orchestrator
        .chat(
            ChatRequest::new("einstein", "next")
                .with_session("s")
                .with_history(client_history),
        )
        .await
        .unwrap();

    let calls = h.llm.calls();
    let second = &calls[1];
    assert_eq!(second.len(), 3);
    assert!(second[0].text.ends_with("] from client"));
    assert_eq!(second[1], ChatMessage::model("client reply"));
}

#[tokio::test]
async fn test_voice_chat_is_stateless() {
    let h = default_harness();
    let reply = h
        .orchestrator
        .voice_chat("einstein", b"webm-bytes", Some("audio/webm"))
        .await
        .unwrap();

    assert_eq!(reply.transcribed_text, "What is relativity?");
    assert!(reply.audio.is_some());
    assert_eq!(h.stt.mimes.lock().unwrap().as_slice(), &["audio/webm".to_string()]);
    assert_eq!(h.llm.calls()[0].len(), 1);
    assert_eq!(h.orchestrator.history().session_count(), 0);
}

#[tokio::test]
async fn test_voice_chat_default_mime() {
    let h = default_harness();
    h.orchestrator.voice_chat("einstein", b"x", None).await.unwrap();
    assert_eq!(h.stt.mimes.lock().unwrap()[0], "audio/mpeg");
}

#[tokio::test]
async fn test_silent_audio_gets_retry_prompt() {
    let h = harness(
        FakeLlm::replying("unused"),
        FakeStt::new(Some("")),
        FakeTts::new(true),
    );
    let reply = h.orchestrator.voice_chat("einstein", b"", None).await.unwrap();

    assert_eq!(reply.transcribed_text, "");
    assert_eq!(reply.reply, UNINTELLIGIBLE_AUDIO_MESSAGE);
    assert!(reply.audio.is_none());
    assert!(h.llm.calls().is_empty());
}

#[tokio::test]
async fn test_blocked_transcript() {
    let h = harness(
        FakeLlm::replying("unused"),
        FakeStt::new(Some("plan an attack")),
        FakeTts::new(true),
    );
    let reply = h.orchestrator.voice_chat("gandhi", b"x", None).await.unwrap();

    assert_eq!(reply.reply, REFUSAL_MESSAGE);
    assert_eq!(reply.transcribed_text, "plan an attack");
    assert!(h.llm.calls().is_empty());
    assert_eq!(h.tts.call_count(), 0);
}

#[tokio::test]
async fn test_stt_failure() {
    let h = harness(FakeLlm::replying("x"), FakeStt::new(None), FakeTts::new(true));
    assert!(matches!(
        h.orchestrator.voice_chat("einstein", b"x", None).await,
        Err(AgentError::TranscriptionUnavailable(_))
    ));
}

#[tokio::test]
async fn test_speak_twice_gives_distinct_files() {
    let h = default_harness();
    let a = h.orchestrator.speak("cleopatra", "Hail").await.unwrap().unwrap();
    let b = h.orchestrator.speak("cleopatra", "Hail").await.unwrap().unwrap();

    assert_ne!(a.filename, b.filename);
    let bytes_a = std::fs::read(h.dir.path().join(&a.filename)).unwrap();
    let bytes_b = std::fs::read(h.dir.path().join(&b.filename)).unwrap();
    assert_eq!(bytes_a, bytes_b);
}

#[tokio::test]
async fn test_speak_unknown_persona_and_empty_text() {
    let h = default_harness();
    assert!(matches!(
        h.orchestrator.speak("nobody", "hi").await,
        Err(AgentError::PersonaNotFound(_))
    ));
    assert!(h.orchestrator.speak("einstein", "").await.unwrap().is_none());
    assert_eq!(h.tts.call_count(), 0);
}
