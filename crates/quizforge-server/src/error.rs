//! Mapping of engine errors onto HTTP responses.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use quizforge_core::error::{InputError, QuizError};

/// Anything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    /// The multipart body could not be read.
    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// The request was not multipart at all.
    #[error("invalid upload: {0}")]
    NotMultipart(#[from] MultipartRejection),
}

impl From<InputError> for ApiError {
    fn from(error: InputError) -> Self {
        Self::Quiz(QuizError::Input(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Quiz(QuizError::Input(e)) => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            Self::Quiz(QuizError::NotFound(_)) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Self::Quiz(QuizError::Session(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": e.to_string() }))
            }
            Self::Quiz(QuizError::Internal(e)) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to process PDF", "details": format!("{e:#}") }),
                )
            }
            Self::Multipart(e) => (e.status(), json!({ "error": e.body_text() })),
            Self::NotMultipart(e) => (e.status(), json!({ "error": e.body_text() })),
        };
        (status, Json(body)).into_response()
    }
}
