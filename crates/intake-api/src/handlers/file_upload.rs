use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/v0/file-upload",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 204, description = "Archive accepted and extracted"),
        (status = 400, description = "Missing file or disallowed extension", body = ErrorResponse),
        (status = 403, description = "Uploads disabled in this environment", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<StatusCode, HttpAppError> {
    let file = extract_multipart_file(multipart, &*state.ledger).await?;
    let file_name = file.name().to_string();

    let outcome = state.pipeline.handle_zip_upload(file).await?;

    for failed in &outcome.failed_entries {
        tracing::debug!(
            file_name = %file_name,
            entry = %failed.relative_path,
            reason = %failed.reason,
            "Archive entry skipped"
        );
    }
    tracing::info!(
        file_name = %file_name,
        succeeded = outcome.succeeded_count,
        failed = outcome.failed_entries.len(),
        "Complaint archive processed"
    );

    Ok(StatusCode::NO_CONTENT)
}
