//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use intake_core::ChallengeKind;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Intake API",
        version = "0.1.0",
        description = "Complaint upload service (v0): zip archives are validated, staged and extracted into the upload directory; the deprecated XML interface is parsed in a sandbox. All upload endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::file_upload::upload_file,
        handlers::xml_upload::upload_xml,
        handlers::complaints::download_complaint,
        handlers::challenges::list_challenges,
        handlers::health::health_check,
    ),
    components(schemas(
        ErrorResponse,
        ChallengeKind,
        handlers::challenges::ChallengesResponse,
        handlers::health::HealthCheckResponse,
        handlers::health::StagingHealth,
    )),
    tags(
        (name = "uploads", description = "Complaint file uploads"),
        (name = "complaints", description = "Extracted complaint files"),
        (name = "challenges", description = "Reported challenge events"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_routes_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v0/file-upload",
            "/api/v0/file-upload/xml",
            "/api/v0/complaints/{name}",
            "/api/v0/challenges",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
