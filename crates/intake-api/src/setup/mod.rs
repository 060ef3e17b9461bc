//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use intake_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    intake_infra::init_telemetry(
        config.service_name(),
        config.environment(),
        config.log_format(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        safe_mode = config.safe_mode(),
        "Configuration loaded and validated successfully"
    );

    let state = Arc::new(
        AppState::new(config.clone()).context("Failed to initialize upload pipeline")?,
    );

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
