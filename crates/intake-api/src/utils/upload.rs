//! Common utilities for file upload handlers

use crate::error::HttpAppError;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use intake_core::{AppError, ChallengeKind, ChallengeSignal, UploadedFile};

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn multipart_error(context: &str, err: MultipartError, signal: &dyn ChallengeSignal) -> HttpAppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        signal.report(ChallengeKind::OversizedUpload, &|| true);
        return HttpAppError(AppError::OversizedFile("File too large".to_string()));
    }
    HttpAppError(AppError::InvalidInput(format!("{}: {}", context, err.body_text())))
}

/// Extract the upload from a multipart form.
///
/// Only one field named "file" is accepted; multiple file fields are rejected.
/// A form without that field yields an [`UploadedFile`] with no name and no
/// content, which the validator reports as a missing file. A body cut off by
/// the hard request limit is reported to `signal` as an oversized upload.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
    signal: &dyn ChallengeSignal,
) -> Result<UploadedFile, HttpAppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e, signal))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        if upload.is_some() {
            return Err(HttpAppError(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            )));
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file data", e, signal))?;

        upload = Some(UploadedFile::new(file_name, content_type, data));
    }

    Ok(upload.unwrap_or_else(|| UploadedFile::new(None, DEFAULT_CONTENT_TYPE, Bytes::new())))
}
