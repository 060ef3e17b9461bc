//! Intake Core Library
//!
//! This crate provides configuration, error types, domain models and the
//! challenge signal shared across all intake components.

pub mod challenge;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use challenge::{ChallengeLedger, ChallengeSignal, NoOpChallengeSignal};
pub use config::{BaseConfig, Config, IntakeConfig, LogFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ChallengeKind, UploadedFile};
