//! Error types for the tahrir-ocr service.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`OcrError`] — **Fatal**: the request cannot produce a result at all
//!   (bad upload, unparsable PDF, the recognition engine unreachable).
//!   Returned as `Err(OcrError)` from the pipeline entry points and mapped
//!   to an HTTP status by the route layer.
//!
//! * [`PageFailure`] — **Non-fatal**: a single page failed (render glitch,
//!   encoding error) but the rest of the document is fine. Absorbed by the
//!   aggregation loop into an in-band annotation so one bad page degrades,
//!   rather than destroys, the result.

use axum::http::StatusCode;
use thiserror::Error;

/// All fatal errors returned by the tahrir-ocr pipeline.
///
/// Page-level failures use [`PageFailure`] and are folded into the output
/// text rather than propagated here.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The upload itself is unusable: missing part, empty filename, or an
    /// extension outside the allowed set. User-correctable.
    #[error("{0}")]
    Validation(String),

    /// The upload exceeds the configured size ceiling.
    #[error("File size exceeds maximum limit of {limit_mb}MB")]
    TooLarge { limit_mb: u64 },

    /// The document could not be parsed as a PDF, or yielded zero pages.
    /// Fatal to the whole request; never retried.
    #[error("Failed to convert the PDF: {detail}")]
    Conversion { detail: String },

    /// Transport or authentication failure talking to the recognition
    /// engine. Fatal — distinct from an engine-reported per-page error,
    /// which is absorbed as a
    /// [`RecognitionOutcome::Failure`](crate::pipeline::recognize::RecognitionOutcome).
    #[error("Recognition engine request failed: {detail}")]
    Engine { detail: String },

    /// Temp-file or filesystem plumbing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error (task join, channel plumbing).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// The HTTP status this error is reported as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            OcrError::Validation(_) => StatusCode::BAD_REQUEST,
            OcrError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            OcrError::Conversion { .. }
            | OcrError::Engine { .. }
            | OcrError::Io(_)
            | OcrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A non-fatal failure for a single page of a multi-page document.
///
/// Produced by the rasterisation stream when one page cannot be rendered or
/// encoded. The aggregation loop converts it into a page annotation and
/// continues with the remaining pages.
#[derive(Debug, Clone, Error)]
pub enum PageFailure {
    /// pdfium could not render this page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    Render { page: usize, detail: String },

    /// The rendered bitmap could not be encoded as PNG.
    #[error("Page {page}: image encoding failed: {detail}")]
    Encode { page: usize, detail: String },
}

impl PageFailure {
    /// 1-based index of the page this failure belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageFailure::Render { page, .. } | PageFailure::Encode { page, .. } => *page,
        }
    }
}
