//! HTTP error response body
//!
//! This module provides the ErrorResponse type for HTTP error responses.
//! Note: IntoResponse implementation for AppError lives in the api crate
//! due to Rust's orphan rule: external traits (axum::IntoResponse) for external types
//! (intake_core::AppError) cannot be implemented here.

use intake_core::{AppError, ErrorMetadata};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Build the body for `error`. Details are only attached when
    /// `include_details` is set and the error is not sensitive.
    pub fn from_app_error(error: &AppError, include_details: bool) -> Self {
        let show_details = include_details && !error.is_sensitive();
        Self {
            error: error.client_message(),
            details: show_details.then(|| error.detailed_message()),
            error_type: show_details.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}
