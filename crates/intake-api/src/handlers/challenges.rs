use crate::state::AppState;
use axum::{extract::State, Json};
use intake_core::{ChallengeKind, ChallengeSignal};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengesResponse {
    /// Reported challenge kinds, in declaration order
    pub solved: Vec<ChallengeKind>,
    pub available: Vec<ChallengeKind>,
}

#[utoipa::path(
    get,
    path = "/api/v0/challenges",
    tag = "challenges",
    responses(
        (status = 200, description = "Challenge events reported so far", body = ChallengesResponse)
    )
)]
pub async fn list_challenges(State(state): State<Arc<AppState>>) -> Json<ChallengesResponse> {
    Json(ChallengesResponse {
        solved: state.ledger.reported(),
        available: ChallengeKind::ALL.to_vec(),
    })
}
