//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<HttpAppError>`) for errors and `?`
//! so they render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_core::{AppError, ErrorMetadata, LogLevel};
use intake_processing::{PathGuardError, PipelineError, ValidationError};

pub use intake_infra::ErrorResponse;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from intake-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app_error = match err {
            ValidationError::MissingFile => AppError::MissingFile("Invalid file".to_string()),
            ValidationError::OversizedFile { .. } => {
                AppError::OversizedFile("File too large".to_string())
            }
            ValidationError::DisallowedExtension { .. } => {
                AppError::DisallowedExtension("Invalid file type".to_string())
            }
        };
        HttpAppError(app_error)
    }
}

impl From<PathGuardError> for HttpAppError {
    fn from(err: PathGuardError) -> Self {
        match err {
            PathGuardError::TraversalAttempt { candidate } => {
                HttpAppError(AppError::PathTraversal(candidate))
            }
        }
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => e.into(),
            PipelineError::Disabled => HttpAppError(AppError::Forbidden(err.to_string())),
            PipelineError::Staging(_) | PipelineError::Extraction(_) => {
                HttpAppError(AppError::InternalWithSource {
                    message: err.to_string(),
                    source: anyhow::Error::new(err),
                })
            }
        }
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details are never shown in production; elsewhere only for non-sensitive errors.
        let body = ErrorResponse::from_app_error(app_error, !is_production_env());

        (status, Json(body)).into_response()
    }
}
