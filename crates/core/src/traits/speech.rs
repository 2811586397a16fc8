//! Speech processing traits

use crate::Result;
use async_trait::async_trait;

/// Speech-to-Text interface
///
/// Implementations:
/// - `GeminiStt` - multimodal transcription via Gemini `generateContent`
/// - `WhisperStt` - OpenAI `/v1/audio/transcriptions`
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(GeminiStt::new(config)?);
/// let text = stt.transcribe(&bytes, "audio/webm").await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe one complete recording
    ///
    /// Returns the transcript trimmed of surrounding whitespace; may be empty
    /// when the recording contains no recognizable speech.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// One speech synthesis provider in the fallback chain
#[async_trait]
pub trait SpeechProvider: Send + Sync + 'static {
    /// Provider name (`elevenlabs`, `gcp`, `openai`), used for ordering,
    /// per-persona voice overrides, logs and metrics
    fn name(&self) -> &'static str;

    /// Whether credentials for this provider are present
    ///
    /// Unconfigured providers are skipped without a network call.
    fn is_configured(&self) -> bool;

    /// File extension of the audio this provider returns
    fn file_extension(&self) -> &'static str {
        "mp3"
    }

    /// Synthesize `text` with the given voice
    ///
    /// An `Ok` result with empty bytes counts as a failure for the chain.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}
