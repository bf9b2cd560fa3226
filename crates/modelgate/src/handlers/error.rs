//! Handler error type rendered as the JSON error envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::llm::{LLMError, ProviderKind};
use crate::response;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Unsupported provider or model (400), or missing credentials (500).
    #[error("{message}")]
    Configuration { status: StatusCode, message: String },

    /// Upstream provider failure (500).
    #[error(transparent)]
    Provider(#[from] LLMError),

    /// Upstream failure reported with a fixed message (500).
    #[error("{0}")]
    Upstream(&'static str),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn missing_key(kind: ProviderKind) -> Self {
        ApiError::Configuration {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!(
                "{} API key is not configured; set {}",
                kind.display_name(),
                kind.env_key()
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration { status, .. } => *status,
            ApiError::Provider(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        response::error(status, self.to_string()).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into validation errors.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unsupported("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::missing_key(ProviderKind::Groq).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(LLMError::NoImage).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_key_names_variable() {
        let err = ApiError::missing_key(ProviderKind::Gemini);
        assert_eq!(
            err.to_string(),
            "Google Gemini API key is not configured; set GEMINI_API_KEY"
        );
    }

    #[test]
    fn provider_errors_keep_their_message() {
        let err = ApiError::from(LLMError::EmptyMessage {
            provider: "Groq".to_string(),
        });
        assert_eq!(err.to_string(), "Groq returned an empty message");
    }
}
