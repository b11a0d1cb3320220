//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;
use tollgate_core::domain::TenantId;
use tollgate_core::ports::{AuthError, PlanDirectoryError};
use tollgate_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    TenantNotFound(TenantId),
    Unauthorized(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::TenantNotFound(tenant) => write!(f, "Tenant not found: {}", tenant),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::TenantNotFound(tenant) => {
                ErrorResponse::not_found(format!("Tenant '{}' does not exist", tenant))
            }
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized().with_detail(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

impl From<PlanDirectoryError> for AppError {
    fn from(err: PlanDirectoryError) -> Self {
        AppError::Internal(format!("Plan directory: {}", err))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
