use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Every variant ends the request; nothing here is retried.
#[derive(Debug)]
pub enum AppError {
    /// A required query parameter is missing or empty.
    Validation(String),
    /// No row matched the lookup.
    NotFound(String),
    /// Any failure raised by the database layer.
    Persistence(sqlx::Error),
    /// Unexpected failure outside the database, e.g. an unreadable request body.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Persistence(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "{}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::WithContext { source, .. } => source.status(),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an `{"error": "..."}` body.
    ///
    /// Server-side failures are logged with their full chain here; the client
    /// only ever sees the innermost message.
    fn into_response(self) -> Response {
        match self {
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {:?}", context, source);
                source.into_response()
            }
            other => {
                let status = other.status();
                match &other {
                    AppError::Persistence(e) => tracing::error!("Database error: {:?}", e),
                    AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
                    AppError::Validation(msg) => tracing::debug!("Rejected request: {}", msg),
                    _ => {}
                }

                let body = Json(json!({
                    "error": other.to_string(),
                }));

                (status, body).into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Persistence(e)),
            context: context.into(),
        })
    }
}
