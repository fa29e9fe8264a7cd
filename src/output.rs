//! Result types: per-page outcomes, the aggregated artifact, and the wire
//! response returned by the API routes.

use crate::pipeline::recognize::RecognitionOutcome;
use serde::{Deserialize, Serialize};

/// The recognition outcome for one page, in document order.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    /// 1-based page index.
    pub page: usize,
    /// What the engine returned for this page.
    pub outcome: RecognitionOutcome,
}

/// The aggregated result of one pipeline run over a document.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    /// The assembled text artifact: plain text for images, a page-delimited
    /// stream with `--- Page N ---` banners for PDFs.
    pub text: String,
    /// Number of pages the pipeline attempted.
    pub page_count: usize,
    /// Number of pages that yielded non-empty text.
    pub pages_with_text: usize,
    /// Per-page outcomes in document order.
    pub pages: Vec<PageOutcome>,
}

/// The JSON body returned by `/api/ocr` on both success and failure.
///
/// The extracted text travels in a field named `markdown` for wire
/// compatibility with the original front-end, although the artifact is
/// plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResponse {
    /// Success body for a completed pipeline run.
    pub fn success(outcome: &OcrOutcome, file_name: impl Into<String>) -> Self {
        Self {
            success: true,
            markdown: outcome.text.clone(),
            page_count: outcome.page_count,
            file_name: Some(file_name.into()),
            error: None,
        }
    }

    /// Failure body carrying the user-facing error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            markdown: String::new(),
            page_count: 0,
            file_name: None,
            error: Some(message.into()),
        }
    }
}
