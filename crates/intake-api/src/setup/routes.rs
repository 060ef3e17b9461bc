//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::constants::{API_PREFIX, BODY_LIMIT_FACTOR, MULTIPART_OVERHEAD_BYTES};
use crate::handlers::{challenges, complaints, file_upload, health, xml_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use intake_core::Config;
use intake_infra::request_id_middleware;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let max_body = body_limit(config);

    let api_routes = Router::new()
        .route("/file-upload", post(file_upload::upload_file))
        .route("/file-upload/xml", post(xml_upload::upload_xml))
        .route("/complaints/{name}", get(complaints::download_complaint))
        .route("/challenges", get(challenges::list_challenges));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest(API_PREFIX, api_routes)
        // The explicit limit below replaces axum's 2 MB default for multipart bodies.
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

/// Hard cap on request bodies, well above the validator's upload limit
pub fn body_limit(config: &Config) -> usize {
    config
        .max_upload_size_bytes()
        .saturating_mul(BODY_LIMIT_FACTOR)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
