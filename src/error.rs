// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Strava rate limit exceeded")]
    StravaRateLimited,

    /// Strava rejected the stored credentials (API 401 or a 4xx from the
    /// token endpoint).
    #[error("{0}")]
    StravaUnauthorized(String),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message for Strava API 401 responses.
    pub const STRAVA_TOKEN_ERROR: &'static str = "Strava token invalid or expired";

    /// Whether this error means the stored Strava credentials are no longer usable.
    pub fn is_strava_token_error(&self) -> bool {
        matches!(self, AppError::StravaUnauthorized(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::StravaApi(msg) => {
                tracing::warn!(error = %msg, "Strava API error");
                (StatusCode::BAD_GATEWAY, "strava_error", None)
            }
            AppError::StravaRateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, "strava_rate_limited", None)
            }
            AppError::StravaUnauthorized(msg) => {
                tracing::warn!(error = %msg, "Strava rejected credentials");
                (StatusCode::UNAUTHORIZED, "strava_unauthorized", None)
            }
            AppError::Identity(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                (StatusCode::INTERNAL_SERVER_ERROR, "identity_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// ─── Form Actions ────────────────────────────────────────────

/// Structured failure returned by admin and dashboard form actions.
///
/// Serializes as `{"error": "..."}`; the message is always safe to show to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub status: StatusCode,
    pub message: String,
}

impl ActionError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Serialize)]
struct ActionErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ActionErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

/// Successful form action response: `{"success": true}`.
#[derive(Debug, Serialize)]
pub struct ActionSuccess {
    pub success: bool,
}

impl ActionSuccess {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Result type alias for form actions.
pub type ActionResult = std::result::Result<Json<ActionSuccess>, ActionError>;

/// Log an infrastructure error and convert it into a generic action failure.
pub fn action_failure(err: AppError, context: &'static str, message: &str) -> ActionError {
    tracing::error!(error = %err, context, "Action failed");
    ActionError::internal(message)
}
