//! Main settings module

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Known LLM backends
pub const LLM_BACKENDS: &[&str] = &["gemini", "openai"];

/// Known STT backends
pub const STT_BACKENDS: &[&str] = &["gemini", "whisper"];

/// Known TTS providers, in default fallback order
pub const TTS_PROVIDERS: &[&str] = &["elevenlabs", "gcp", "openai"];

/// Comma-separated CORS origins, applied over any file value
pub const ALLOW_ORIGINS_ENV: &str = "ALLOW_ORIGINS";

const CORS_ORIGINS_ENV: &str = "PASTPORT__SERVER__CORS_ORIGINS";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    /// Staging mode
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Vendor credentials, endpoints and client timeout
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Response generation backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Transcription backend
    #[serde(default)]
    pub stt: SttConfig,

    /// Speech synthesis chain and audio storage
    #[serde(default)]
    pub tts: TtsConfig,

    /// Session history policy
    #[serde(default)]
    pub history: HistoryConfig,

    /// Content filter
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Persona file location
    #[serde(default)]
    pub personas: PersonasConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_providers()?;
        self.validate_backends()?;
        self.validate_time_budget()?;

        if self.history.max_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.max_turns".to_string(),
                message: "Must keep at least 1 turn".to_string(),
            });
        }

        if self.environment.is_production() {
            self.validate_production()?;
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_upload_bytes".to_string(),
                message: "Upload limit must be positive".to_string(),
            });
        }

        Ok(())
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        if self.providers.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "providers.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// The request timeout must outlast the slowest flow: voice chat runs
    /// STT and LLM calls (each bounded by the provider timeout) and then the
    /// whole TTS chain (bounded by the TTS budget).
    fn validate_time_budget(&self) -> Result<(), ConfigError> {
        if self.tts.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tts.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        let worst_case = 2 * self.providers.timeout_seconds + self.tts.timeout_seconds;
        if self.server.timeout_seconds <= worst_case {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: format!(
                    "Must exceed 2 x providers.timeout_seconds + tts.timeout_seconds ({}s)",
                    worst_case
                ),
            });
        }

        Ok(())
    }

    fn validate_backends(&self) -> Result<(), ConfigError> {
        if !LLM_BACKENDS.contains(&self.llm.backend.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "llm.backend".to_string(),
                message: format!(
                    "Unknown backend '{}', expected one of {:?}",
                    self.llm.backend, LLM_BACKENDS
                ),
            });
        }

        if !STT_BACKENDS.contains(&self.stt.backend.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "stt.backend".to_string(),
                message: format!(
                    "Unknown backend '{}', expected one of {:?}",
                    self.stt.backend, STT_BACKENDS
                ),
            });
        }

        for name in &self.tts.provider_order {
            if !TTS_PROVIDERS.contains(&name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "tts.provider_order".to_string(),
                    message: format!(
                        "Unknown provider '{}', expected any of {:?}",
                        name, TTS_PROVIDERS
                    ),
                });
            }
        }

        Ok(())
    }

    /// Production refuses to start without an LLM credential or with a
    /// wildcard CORS origin
    fn validate_production(&self) -> Result<(), ConfigError> {
        let key = match self.llm.backend.as_str() {
            "openai" => &self.providers.openai_api_key,
            _ => &self.providers.gemini_api_key,
        };
        if key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField(format!(
                "providers.{}_api_key (required in production)",
                self.llm.backend
            )));
        }

        if self.server.cors_enabled && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_origins".to_string(),
                message: "Wildcard origin not allowed in production".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Maximum multipart upload size
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    90
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Vendor credentials and endpoints
///
/// Keys fall back to the conventional environment variables when not set in
/// a config file or through `PASTPORT__PROVIDERS__*`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Per-call HTTP client timeout
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_gemini_key")]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default = "default_openai_key")]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_elevenlabs_key")]
    pub elevenlabs_api_key: Option<String>,

    #[serde(default = "default_elevenlabs_base_url")]
    pub elevenlabs_base_url: String,

    #[serde(default = "default_gcp_tts_key")]
    pub gcp_tts_api_key: Option<String>,

    #[serde(default = "default_gcp_tts_base_url")]
    pub gcp_tts_base_url: String,
}

// Keys must never reach logs
impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(key: &Option<String>) -> &'static str {
            match key {
                Some(k) if !k.is_empty() => "<set>",
                _ => "<unset>",
            }
        }

        f.debug_struct("ProvidersConfig")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("elevenlabs_api_key", &mask(&self.elevenlabs_api_key))
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("gcp_tts_api_key", &mask(&self.gcp_tts_api_key))
            .field("gcp_tts_base_url", &self.gcp_tts_base_url)
            .finish()
    }
}

fn env_key(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_gemini_key() -> Option<String> {
    env_key(&["GEMINI_API_KEY", "GOOGLE_API_KEY"])
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_key() -> Option<String> {
    env_key(&["OPENAI_API_KEY"])
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_elevenlabs_key() -> Option<String> {
    env_key(&["ELEVENLABS_API_KEY", "ELEVEN_API_KEY"])
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_gcp_tts_key() -> Option<String> {
    env_key(&["GCP_TTS_API_KEY"])
}

fn default_gcp_tts_base_url() -> String {
    "https://texttospeech.googleapis.com/v1".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_provider_timeout(),
            gemini_api_key: default_gemini_key(),
            gemini_base_url: default_gemini_base_url(),
            openai_api_key: default_openai_key(),
            openai_base_url: default_openai_base_url(),
            elevenlabs_api_key: default_elevenlabs_key(),
            elevenlabs_base_url: default_elevenlabs_base_url(),
            gcp_tts_api_key: default_gcp_tts_key(),
            gcp_tts_base_url: default_gcp_tts_base_url(),
        }
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `gemini` or `openai`
    #[serde(default = "default_llm_backend")]
    pub backend: String,

    /// Model override; each backend has its own default
    #[serde(default)]
    pub model: Option<String>,
}

fn default_llm_backend() -> String {
    "gemini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            model: None,
        }
    }
}

/// STT backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// `gemini` or `whisper`
    #[serde(default = "default_stt_backend")]
    pub backend: String,

    #[serde(default)]
    pub model: Option<String>,

    /// Mime type assumed for uploads without one
    #[serde(default = "default_mime_type")]
    pub default_mime_type: String,
}

fn default_stt_backend() -> String {
    "gemini".to_string()
}

fn default_mime_type() -> String {
    pastport_core::DEFAULT_AUDIO_MIME.to_string()
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            backend: default_stt_backend(),
            model: None,
            default_mime_type: default_mime_type(),
        }
    }
}

/// Speech synthesis chain and audio storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Provider names in fallback order
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<String>,

    /// Directory synthesized audio is written to
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    /// URL prefix audio files are served under
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// ElevenLabs model id
    #[serde(default = "default_elevenlabs_model")]
    pub elevenlabs_model: String,

    /// GCP voice language code
    #[serde(default = "default_language_code")]
    pub gcp_language_code: String,

    /// OpenAI speech model
    #[serde(default = "default_openai_tts_model")]
    pub openai_model: String,

    /// Budget for the whole fallback chain of one reply; when exhausted the
    /// reply is sent without audio
    #[serde(default = "default_tts_timeout")]
    pub timeout_seconds: u64,
}

fn default_tts_timeout() -> u64 {
    20
}

fn default_provider_order() -> Vec<String> {
    TTS_PROVIDERS.iter().map(|s| s.to_string()).collect()
}

fn default_audio_dir() -> String {
    "static/audio".to_string()
}

fn default_url_prefix() -> String {
    "/api/audio".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_openai_tts_model() -> String {
    "tts-1".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider_order: default_provider_order(),
            audio_dir: default_audio_dir(),
            url_prefix: default_url_prefix(),
            elevenlabs_model: default_elevenlabs_model(),
            gcp_language_code: default_language_code(),
            openai_model: default_openai_tts_model(),
            timeout_seconds: default_tts_timeout(),
        }
    }
}

/// Session history policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Turns kept per session (user and assistant turns each count)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

/// Content filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_banned_words")]
    pub banned_words: Vec<String>,
}

fn default_banned_words() -> Vec<String> {
    pastport_core::DEFAULT_BANNED_WORDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            banned_words: default_banned_words(),
        }
    }
}

/// Persona file location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonasConfig {
    /// YAML or JSON file; built-in personas are used when it does not exist
    #[serde(default = "default_personas_path")]
    pub path: String,
}

fn default_personas_path() -> String {
    "config/personas.yaml".to_string()
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            path: default_personas_path(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and expose `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` and the process environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env, |key| std::env::var(key).ok())
}

/// Load settings from `config_dir`, with `lookup` resolving the plain
/// (unprefixed) environment variables
///
/// `ALLOW_ORIGINS` replaces `server.cors_origins` from files, unless
/// `PASTPORT__SERVER__CORS_ORIGINS` is set.
pub fn load_settings_from<F>(
    config_dir: impl AsRef<Path>,
    env: Option<&str>,
    lookup: F,
) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let dir = config_dir.as_ref();
    let mut builder = Config::builder();

    builder =
        builder.add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("PASTPORT")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .with_list_parse_key("tts.provider_order")
            .with_list_parse_key("safety.banned_words"),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    if lookup(CORS_ORIGINS_ENV).is_none() {
        if let Some(origins) = lookup(ALLOW_ORIGINS_ENV) {
            settings.server.cors_origins = parse_origins(&origins);
            tracing::debug!(
                count = settings.server.cors_origins.len(),
                "CORS origins taken from {}",
                ALLOW_ORIGINS_ENV
            );
        }
    }

    settings.validate()?;

    Ok(settings)
}
