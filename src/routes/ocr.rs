//! OCR API endpoints.
//!
//! `POST /api/ocr` accepts a multipart upload in field `file` and returns
//! the extracted text as JSON. `POST /api/ocr/download` runs the identical
//! pipeline and streams the artifact back as a downloadable plain-text
//! file. Both share one failure shape: `{success: false, error}` with the
//! status from [`OcrError::status_code`].

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::{OcrOutcome, OcrResponse};
use crate::pipeline::process::process;
use crate::state::AppState;
use crate::upload::{self, UploadedDocument};
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::Path;
use tracing::{error, info};

/// Run OCR on an uploaded document and return the text as JSON.
pub async fn run_ocr(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    match run_pipeline(&state, &headers, multipart).await {
        Ok((outcome, file_name)) => {
            (StatusCode::OK, Json(OcrResponse::success(&outcome, file_name))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Run the same pipeline, but stream the artifact back as an attachment
/// named `<original-stem>_ocr.txt`.
pub async fn download_ocr(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    match run_pipeline(&state, &headers, multipart).await {
        Ok((outcome, file_name)) => {
            let stem = Path::new(&file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "text/plain; charset=utf-8".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{stem}_ocr.txt\""),
                    ),
                ],
                outcome.text,
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Shared handler body: gatekeep the upload, run the pipeline, and hand
/// back the outcome plus the declared filename. The temp file created by
/// the gatekeeper is dropped — and therefore removed — when `document`
/// goes out of scope, on every path out of this function.
async fn run_pipeline(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
) -> Result<(OcrOutcome, String), OcrError> {
    reject_oversize_declaration(headers, &state.config)?;

    let document = read_upload(multipart, state).await?;
    info!(file = document.file_name(), "OCR request accepted");

    let outcome = process(&state.recognizer, &document, &state.config).await?;
    Ok((outcome, document.file_name().to_string()))
}

/// Reject early on the declared `Content-Length`, before buffering the
/// body. The gatekeeper re-checks the actual byte count after the read.
fn reject_oversize_declaration(headers: &HeaderMap, config: &OcrConfig) -> Result<(), OcrError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > config.max_upload_bytes {
            return Err(OcrError::TooLarge {
                limit_mb: (config.max_upload_bytes / (1024 * 1024)) as u64,
            });
        }
    }
    Ok(())
}

/// Pull the `file` field out of the multipart body and run it through the
/// upload gatekeeper.
async fn read_upload(
    mut multipart: Multipart,
    state: &AppState,
) -> Result<UploadedDocument, OcrError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::Validation(format!("Failed to read upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| OcrError::Validation(format!("Failed to read file data: {e}")))?;

        return upload::validate_and_store(&file_name, &bytes, &state.config);
    }

    Err(OcrError::Validation("No file part in the request".into()))
}

/// Map a fatal pipeline error to the shared JSON failure shape.
fn error_response(err: OcrError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!("OCR request failed: {err}");
    }
    (status, Json(OcrResponse::failure(err.to_string()))).into_response()
}
