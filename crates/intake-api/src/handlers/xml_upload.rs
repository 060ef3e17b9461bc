use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, State},
    response::Response,
};
use intake_core::AppError;
use intake_processing::XmlUploadResult;
use std::sync::Arc;

/// Deprecated XML complaint interface. It never succeeds: a parsed document
/// is answered with 410 and an excerpt, a parse that runs out of budget with 503.
#[utoipa::path(
    post,
    path = "/api/v0/file-upload/xml",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 400, description = "Missing file or not an .xml file", body = ErrorResponse),
        (status = 410, description = "Interface deprecated; echoes a document excerpt", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Parse exceeded its time budget", body = ErrorResponse)
    )
)]
pub async fn upload_xml(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let file = extract_multipart_file(multipart, &*state.ledger).await?;
    let file_name = file.name().to_string();

    let result = state.pipeline.handle_xml_upload(file).await?;
    let message = result.client_message(&file_name);

    let error = match result {
        XmlUploadResult::Timeout => AppError::ServiceUnavailable(message),
        XmlUploadResult::Deprecated { .. }
        | XmlUploadResult::ParseFailed { .. }
        | XmlUploadResult::Disabled => AppError::Gone(message),
    };

    Err(error.into())
}
