//! PastPort Server
//!
//! HTTP endpoints for persona chat, voice chat, speech synthesis and
//! audio retrieval.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_error, record_request};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pastport_agent::AgentError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Agent(e) => e.kind(),
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::NotFound(_) => "not_found",
            ServerError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Agent(AgentError::PersonaNotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Agent(AgentError::ServiceUnavailable(_))
            | ServerError::Agent(AgentError::TranscriptionUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::Agent(AgentError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ServerError::Agent(AgentError::Initialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<pastport_pipeline::PipelineError> for ServerError {
    fn from(err: pastport_pipeline::PipelineError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        if status.is_server_error() {
            tracing::error!(kind, error = %self, "Request failed");
        } else {
            tracing::debug!(kind, error = %self, "Request rejected");
        }
        record_error(kind);

        let body = Json(serde_json::json!({
            "error": kind,
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ServerError::from(AgentError::PersonaNotFound("x".into())),
                StatusCode::NOT_FOUND,
                "persona_not_found",
            ),
            (
                ServerError::from(AgentError::ServiceUnavailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
            ),
            (
                ServerError::from(AgentError::TranscriptionUnavailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "transcription_unavailable",
            ),
            (
                ServerError::InvalidRequest("x".into()),
                StatusCode::BAD_REQUEST,
                "invalid_request",
            ),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.kind(), kind);
        }
    }
}
