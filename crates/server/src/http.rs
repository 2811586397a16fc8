//! HTTP Endpoints
//!
//! REST API for persona chat, voice chat and speech.

use std::time::Duration;

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Path, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pastport_agent::ChatRequest;
use pastport_core::{PersonaSummary, Turn, TurnRole};
use pastport_pipeline::content_type_for;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_handler, record_request};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);
    let body_limit = server.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/personas", get(list_personas))
        .route("/api/chat", post(chat))
        .route("/api/transcribe", post(transcribe))
        .route("/api/tts", post(tts))
        .route("/api/audio/:filename", get(get_audio))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors_layer)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - Disabled: permissive
/// - `*` in the list: any origin, no credentials
/// - Empty or all invalid: localhost:3000 only
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins");
        return CorsLayer::permissive();
    }

    if origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS configured for any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.trim().parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(methods)
        .allow_headers(Any)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "PastPort AI Backend is running.",
    }))
}

/// Health check with a provider configuration summary
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let providers = state.orchestrator.provider_status();
    let status = if providers.llm_model.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    Json(serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "llm": providers.llm_model,
            "stt": providers.stt_model,
            "tts": providers.tts_providers,
            "personas": state.orchestrator.personas().len(),
        },
    }))
}

async fn list_personas(State(state): State<AppState>) -> Json<Vec<PersonaSummary>> {
    record_request("personas");
    Json(state.orchestrator.personas().summaries())
}

/// One prior conversation turn as sent by clients
#[derive(Debug, Deserialize)]
struct HistoryItem {
    role: String,
    #[serde(alias = "content")]
    text: String,
}

impl From<HistoryItem> for Turn {
    fn from(item: HistoryItem) -> Self {
        Turn::new(TurnRole::from_str_loose(&item.role), item.text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    #[serde(alias = "persona_id")]
    persona: String,
    message: String,
    #[serde(default)]
    history: Vec<HistoryItem>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
    audio_url: Option<String>,
    session_id: String,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    record_request("chat");
    let Json(payload) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let history = payload.history.into_iter().map(Turn::from).collect();
    let mut request = ChatRequest::new(payload.persona, payload.message).with_history(history);
    if let Some(session_id) = payload.session_id {
        request = request.with_session(session_id);
    }

    let reply = state.orchestrator.chat(request).await?;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        audio_url: reply.audio.map(|a| a.url),
        session_id: reply.session_id,
    }))
}

#[derive(Debug, Serialize)]
struct VoiceResponse {
    reply: String,
    audio_url: Option<String>,
    transcribed_text: String,
}

/// Voice chat from a multipart upload (`audio` or `file`, `persona` or `persona_id`)
///
/// Voice chat keeps no session history, so other fields (a client's
/// `session_id` included) are ignored.
async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceResponse>, ServerError> {
    record_request("transcribe");
    let mut multipart = multipart.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let mut audio = None;
    let mut mime_type = None;
    let mut persona = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" | "file" => {
                mime_type = field
                    .content_type()
                    .filter(|ct| *ct != "application/octet-stream")
                    .map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
                audio = Some(bytes);
            }
            "persona" | "persona_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
                persona = Some(text.trim().to_string());
            }
            other => tracing::debug!(field = other, "Ignoring multipart field"),
        }
    }

    let audio = audio.ok_or_else(|| ServerError::InvalidRequest("missing 'audio' field".into()))?;
    let persona =
        persona.ok_or_else(|| ServerError::InvalidRequest("missing 'persona' field".into()))?;

    tracing::debug!(
        persona = %persona,
        bytes = audio.len(),
        mime = mime_type.as_deref().unwrap_or("-"),
        "Voice upload received"
    );

    let reply = state
        .orchestrator
        .voice_chat(&persona, &audio, mime_type.as_deref())
        .await?;

    Ok(Json(VoiceResponse {
        reply: reply.reply,
        audio_url: reply.audio.map(|a| a.url),
        transcribed_text: reply.transcribed_text,
    }))
}

#[derive(Debug, Deserialize)]
struct TtsPayload {
    #[serde(alias = "persona_id")]
    persona: String,
    text: String,
}

/// Speak text in a persona's voice; 204 when no provider produced audio
async fn tts(
    State(state): State<AppState>,
    payload: Result<Json<TtsPayload>, JsonRejection>,
) -> Result<Response, ServerError> {
    record_request("tts");
    let Json(payload) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    match state.orchestrator.speak(&payload.persona, &payload.text).await? {
        Some(audio) => Ok(Json(serde_json::json!({ "audio_url": audio.url })).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn get_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ServerError> {
    record_request("audio");
    let bytes = state
        .orchestrator
        .synthesizer()
        .store()
        .read(&filename)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("audio file '{}'", filename)))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], bytes).into_response())
}
