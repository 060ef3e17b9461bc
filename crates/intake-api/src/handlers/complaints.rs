use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use intake_core::AppError;
use std::io;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v0/complaints/{name}",
    tag = "complaints",
    params(
        ("name" = String, Path, description = "Name of an extracted complaint file")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Path escapes the upload directory", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn download_complaint(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let destination = state.pipeline.extractor().guard().resolve(&name)?;
    let path = destination.as_path();

    let not_found = || HttpAppError(AppError::NotFound("File not found".to_string()));

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::from(e).into()),
    };
    if !metadata.is_file() {
        return Err(not_found());
    }

    let content = tokio::fs::read(path).await.map_err(AppError::from)?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        content,
    ))
}
