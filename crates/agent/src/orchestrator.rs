//! Pipeline orchestrator
//!
//! Composes persona lookup, content filtering, history, generation,
//! transcription and synthesis into the three request flows:
//!
//! ```text
//! chat:       persona -> filter -> history context -> LLM -> history append -> TTS
//! voice_chat: persona -> STT -> (empty? / filter) -> LLM (no history) -> TTS
//! speak:      persona -> TTS
//! ```
//!
//! LLM failure fails the request before any synthesis is attempted. TTS
//! failure never fails a request; the reply simply carries no audio. The
//! same holds when the TTS chain runs past its budget.

use std::sync::Arc;
use std::time::Duration;

use pastport_config::{PersonaRegistry, Settings};
use pastport_core::{AudioReference, ContentFilter, Persona, Turn};
use pastport_llm::{LlmFactory, LlmProvider, LlmProviderConfig};
use pastport_pipeline::{create_providers, create_stt, AudioStore, SpeechSynthesizer};

use crate::generation::ResponseGenerator;
use crate::history::{truncate_to_last, HistoryStore};
use crate::transcription::TranscriptionService;
use crate::{AgentError, REFUSAL_MESSAGE, UNINTELLIGIBLE_AUDIO_MESSAGE};

/// Default history cap
pub const DEFAULT_MAX_TURNS: usize = 10;

/// A text chat request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub persona_id: String,
    pub message: String,
    /// Client-held history; overrides the stored session history when non-empty
    pub history: Vec<Turn>,
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(persona_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}

/// Result of a text chat
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub audio: Option<AudioReference>,
    pub session_id: String,
}

/// Result of a voice chat
#[derive(Debug, Clone)]
pub struct VoiceReply {
    pub reply: String,
    pub audio: Option<AudioReference>,
    pub transcribed_text: String,
}

/// Which providers are usable, for health reporting
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub llm_model: Option<String>,
    pub stt_model: Option<String>,
    pub tts_providers: Vec<&'static str>,
}

/// Request flow coordinator
pub struct Orchestrator {
    personas: Arc<PersonaRegistry>,
    history: Arc<HistoryStore>,
    filter: ContentFilter,
    generator: ResponseGenerator,
    transcriber: TranscriptionService,
    synthesizer: Arc<SpeechSynthesizer>,
    max_turns: usize,
}

impl Orchestrator {
    pub fn new(
        personas: Arc<PersonaRegistry>,
        generator: ResponseGenerator,
        transcriber: TranscriptionService,
        synthesizer: Arc<SpeechSynthesizer>,
    ) -> Self {
        Self {
            personas,
            history: Arc::new(HistoryStore::new()),
            filter: ContentFilter::default(),
            generator,
            transcriber,
            synthesizer,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_history_store(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Wire every collaborator from settings
    ///
    /// Missing LLM or STT credentials are logged and leave that service
    /// disabled; requests needing it fail with a 503-class error.
    pub fn from_settings(
        settings: &Settings,
        personas: Arc<PersonaRegistry>,
    ) -> Result<Self, AgentError> {
        let providers = &settings.providers;
        let timeout = Duration::from_secs(providers.timeout_seconds);

        let llm_provider = LlmProvider::from_str(&settings.llm.backend).ok_or_else(|| {
            AgentError::Initialization(format!("unknown LLM backend '{}'", settings.llm.backend))
        })?;
        let (api_key, endpoint) = match llm_provider {
            LlmProvider::Gemini => (providers.gemini_api_key.clone(), &providers.gemini_base_url),
            LlmProvider::OpenAI => (providers.openai_api_key.clone(), &providers.openai_base_url),
        };
        let mut llm_config = LlmProviderConfig::new(llm_provider, api_key)
            .with_endpoint(endpoint.as_str())
            .with_timeout(timeout);
        if let Some(model) = settings.llm.model.as_deref() {
            llm_config = llm_config.with_model(model);
        }
        let generator = ResponseGenerator::new(LlmFactory::try_create(&llm_config));

        let stt = match create_stt(settings) {
            Ok(stt) => Some(stt),
            Err(e) => {
                tracing::warn!(error = %e, "Speech-to-text unavailable");
                None
            }
        };
        let transcriber = TranscriptionService::new(stt)
            .with_default_mime_type(settings.stt.default_mime_type.as_str());

        let store = AudioStore::new(&settings.tts.audio_dir, settings.tts.url_prefix.as_str());
        let synthesizer = SpeechSynthesizer::new(create_providers(settings)?, store)
            .with_budget(Duration::from_secs(settings.tts.timeout_seconds));
        if !synthesizer.has_configured_provider() {
            tracing::warn!("No TTS provider configured, replies will carry no audio");
        }

        Ok(Self::new(personas, generator, transcriber, Arc::new(synthesizer))
            .with_filter(ContentFilter::new(&settings.safety.banned_words))
            .with_max_turns(settings.history.max_turns))
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn synthesizer(&self) -> &SpeechSynthesizer {
        &self.synthesizer
    }

    pub fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            llm_model: self.generator.model_name().map(String::from),
            stt_model: self.transcriber.model_name().map(String::from),
            tts_providers: self.synthesizer.configured_providers(),
        }
    }

    fn persona(&self, id: &str) -> Result<&Persona, AgentError> {
        self.personas
            .get(id)
            .ok_or_else(|| AgentError::PersonaNotFound(id.to_string()))
    }

    /// Text chat
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AgentError> {
        let persona = self.persona(&request.persona_id)?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(AgentError::InvalidRequest("message cannot be empty".to_string()));
        }

        let session_id = request
            .session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if self.filter.is_blocked(message) {
            tracing::info!(persona = %persona.id, session = %session_id, "Message blocked by content filter");
            metrics::counter!("pastport_blocked_messages_total", "flow" => "chat").increment(1);
            return Ok(ChatReply {
                reply: REFUSAL_MESSAGE.to_string(),
                audio: None,
                session_id,
            });
        }

        let context = if request.history.is_empty() {
            self.history.get_history(&session_id)
        } else {
            request.history
        };
        let context = truncate_to_last(context, self.max_turns);

        let reply = self.generator.generate(persona, message, &context).await?;

        self.history.append_and_trim(
            &session_id,
            vec![Turn::user(message), Turn::assistant(reply.as_str())],
            self.max_turns,
        );

        let audio = self.synthesizer.synthesize(persona, &reply).await;

        tracing::info!(
            persona = %persona.id,
            session = %session_id,
            context_turns = context.len(),
            has_audio = audio.is_some(),
            "Chat turn complete"
        );

        Ok(ChatReply {
            reply,
            audio,
            session_id,
        })
    }

    /// Voice chat; stateless with respect to session history
    pub async fn voice_chat(
        &self,
        persona_id: &str,
        audio: &[u8],
        mime_type: Option<&str>,
    ) -> Result<VoiceReply, AgentError> {
        let persona = self.persona(persona_id)?;

        let transcript = self.transcriber.transcribe(audio, mime_type).await?;

        if transcript.is_empty() {
            tracing::info!(persona = %persona.id, bytes = audio.len(), "Recording produced no transcript");
            return Ok(VoiceReply {
                reply: UNINTELLIGIBLE_AUDIO_MESSAGE.to_string(),
                audio: None,
                transcribed_text: transcript,
            });
        }

        if self.filter.is_blocked(&transcript) {
            tracing::info!(persona = %persona.id, "Transcript blocked by content filter");
            metrics::counter!("pastport_blocked_messages_total", "flow" => "voice").increment(1);
            return Ok(VoiceReply {
                reply: REFUSAL_MESSAGE.to_string(),
                audio: None,
                transcribed_text: transcript,
            });
        }

        let reply = self.generator.generate(persona, &transcript, &[]).await?;
        let audio = self.synthesizer.synthesize(persona, &reply).await;

        tracing::info!(persona = %persona.id, has_audio = audio.is_some(), "Voice turn complete");

        Ok(VoiceReply {
            reply,
            audio,
            transcribed_text: transcript,
        })
    }

    /// Speak arbitrary text in a persona's voice
    pub async fn speak(
        &self,
        persona_id: &str,
        text: &str,
    ) -> Result<Option<AudioReference>, AgentError> {
        let persona = self.persona(persona_id)?;
        Ok(self.synthesizer.synthesize(persona, text).await)
    }
}
