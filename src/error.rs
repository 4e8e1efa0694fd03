//! Error types shared by the store, the upload helper and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routes::ErrorResponse;

/// Failures raised by a [`crate::db::ContentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another document in the same collection already owns this slug.
    #[error("slug `{0}` is already taken")]
    SlugTaken(String),
    /// A uniqueness rule other than the slug index was violated.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Map a sqlx error onto the store taxonomy, turning unique-index
    /// violations into [`StoreError::SlugTaken`] for the given slug.
    pub(crate) fn from_insert(err: sqlx::Error, slug: Option<&str>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return match slug {
                    Some(s) => StoreError::SlugTaken(s.to_string()),
                    None => StoreError::Conflict(db.message().to_string()),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Failures raised while storing an uploaded file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(&'static str),
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Handler-boundary error. Every variant maps to one status code; internal
/// variants are logged and reported with a static message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired reset token")]
    InvalidResetToken,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("too many requests")]
    TooManyRequests,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages("", &errors, &mut messages);
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}

fn collect_messages(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    match &err.message {
                        Some(msg) if prefix.is_empty() => out.push(msg.to_string()),
                        Some(msg) => out.push(format!("{prefix}: {msg}")),
                        None => out.push(format!("{path} is invalid")),
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(&format!("{path}.{index}"), inner, out);
                }
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "Missing required fields",
                Some(msg),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Invalid request body", Some(msg)),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found", None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some("A valid admin session is required".to_string()),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                None,
            ),
            AppError::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired reset token",
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg)),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later.",
                None,
            ),
            AppError::Upload(UploadError::Rejected(reason)) => (
                StatusCode::BAD_REQUEST,
                "Invalid upload",
                Some(reason.to_string()),
            ),
            AppError::Store(StoreError::SlugTaken(slug)) => (
                StatusCode::CONFLICT,
                "Slug already exists",
                Some(slug),
            ),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
