//! Health check handler and response types.

use crate::state::AppState;
use axum::{extract::State, Json};
use intake_core::ChallengeSignal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StagingHealth {
    pub acquired: usize,
    pub released: usize,
    pub outstanding: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub environment: String,
    pub safe_mode: bool,
    pub solved_challenges: usize,
    pub staging: StagingHealth,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    let stats = state.pipeline.staging_stats();

    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: state.config.service_name().to_string(),
        environment: state.config.environment().to_string(),
        safe_mode: state.config.safe_mode(),
        solved_challenges: state.ledger.reported().len(),
        staging: StagingHealth {
            acquired: stats.acquired,
            released: stats.released,
            outstanding: stats.outstanding(),
        },
    })
}
