//! Error types for the salon booking server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine-usable error kinds reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    Unauthenticated,
    Forbidden,
    NotFound,
    AvailabilityConflict,
    InvalidState,
    PromoIneligible,
    PersistenceError,
    InternalError,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Staff off duty or slot already taken
    #[error("Availability conflict: {0}")]
    AvailabilityConflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Promo code ineligible: {0}")]
    PromoIneligible(String),

    /// Timed out waiting for a staff calendar or promo lock
    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::Authentication(_) => ErrorKind::Unauthenticated,
            AppError::Authorization(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::AvailabilityConflict(_) => ErrorKind::AvailabilityConflict,
            AppError::InvalidState(_) => ErrorKind::InvalidState,
            AppError::PromoIneligible(_) => ErrorKind::PromoIneligible,
            AppError::LockTimeout(_) | AppError::Persistence(_) | AppError::Database(_) => {
                ErrorKind::PersistenceError
            }
            AppError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::LockTimeout(_) | AppError::Persistence(_) => true,
            AppError::Database(e) => !is_integrity_violation(e),
            _ => false,
        }
    }

    /// Classify a database error, turning lock and serialization failures into
    /// retryable lock timeouts.
    pub fn from_db(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            // 55P03 lock_not_available, 40P01 deadlock_detected, 40001 serialization_failure
            match db_err.code().as_deref() {
                Some("55P03") | Some("40P01") | Some("40001") => {
                    return AppError::LockTimeout(db_err.message().to_string());
                }
                // foreign_key_violation: staff, customer or service row is missing
                Some("23503") => {
                    return AppError::NotFound(db_err.message().to_string());
                }
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

/// Class 23 SQLSTATE: the write itself is rejected and retrying cannot help
fn is_integrity_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code.starts_with("23"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::AvailabilityConflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PromoIneligible(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::LockTimeout(msg) => {
                tracing::warn!("Lock timeout: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Calendar is busy, please retry".to_string(),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage unavailable, please retry".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let kind = self.kind();
        let body = Json(ErrorResponse {
            kind,
            error: format!("{:?}", kind),
            message,
            retryable: self.is_retryable(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
