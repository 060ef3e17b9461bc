//! Intake API Library
//!
//! This crate provides the HTTP handlers, application state and setup for the
//! complaint upload service.

mod api_doc;
pub mod constants;
mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
