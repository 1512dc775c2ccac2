// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::core::selector::{ReconstructError, SelectError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (configuration errors, validation failures)
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., double submission)
    Conflict(String),

    // 422 Unprocessable Entity: the question range selects nothing, so
    // there is no assessment to begin.
    EmptySelection(String),

    // 409, soft and recoverable: manual submission with an unanswered
    // question. Carries the presentation index of the first unanswered
    // slot so the client can navigate the user back to it.
    IncompleteAnswers { first_unanswered: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::EmptySelection(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg }))
            }
            AppError::IncompleteAnswers { first_unanswered } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Not every question has been answered",
                    "firstUnanswered": first_unanswered,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Selector failures map onto the configuration-error taxonomy: bad range
/// bounds and non-positive counts are the caller's fault, an empty range
/// means there is nothing to ask.
impl From<SelectError> for AppError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::EmptyRange => AppError::EmptySelection(err.to_string()),
            SelectError::InvalidCount(_) | SelectError::InvalidRange { .. } => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

/// A malformed stored order array is server-side corruption, never a
/// trigger for silent re-randomization.
impl From<ReconstructError> for AppError {
    fn from(err: ReconstructError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}
