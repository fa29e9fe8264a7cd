//! Result aggregation: drive rasterisation and recognition across all pages
//! and assemble the labeled text artifact.
//!
//! The loop is deliberately sequential — one page in flight at a time, in
//! document order. Page order must be preserved in the final artifact, and
//! sequential processing is the simplest arrangement that guarantees it
//! while keeping peak memory at a single page.
//!
//! Failure semantics: rasterisation failure of the whole document is fatal;
//! an engine-reported failure on one page of a PDF becomes an in-band
//! annotation and the loop continues — a single bad page must not lose the
//! remaining pages' text.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::{OcrOutcome, PageOutcome};
use crate::pipeline::raster;
use crate::pipeline::recognize::{DetectionMode, RecognitionOutcome, TextRecognizer};
use crate::upload::{DocumentKind, UploadedDocument};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Banner prefixed to every page of a PDF-derived artifact.
fn page_banner(page: usize) -> String {
    format!("--- Page {page} ---\n\n")
}

/// Run the full pipeline over one validated document.
///
/// Returns `Ok` even when individual pages failed recognition — inspect the
/// per-page outcomes or the annotations in `text`. Returns `Err` only for
/// fatal conditions: unparsable document, or the engine unreachable.
pub async fn process(
    recognizer: &Arc<dyn TextRecognizer>,
    document: &UploadedDocument,
    config: &OcrConfig,
) -> Result<OcrOutcome, OcrError> {
    let mode = match document.kind() {
        DocumentKind::Image => DetectionMode::PlainText,
        DocumentKind::Pdf => DetectionMode::Document,
    };

    let (mut pages, total) = raster::page_stream(document, config.dpi).await?;
    info!(
        file = document.file_name(),
        pages = total,
        mode = ?mode,
        "processing document"
    );

    let mut outcomes: Vec<PageOutcome> = Vec::with_capacity(total);
    while let Some(item) = pages.next().await {
        let (page, outcome) = match item {
            Ok(page) => {
                let index = page.index;
                (index, recognizer.recognize(&page.bytes, mode).await?)
            }
            Err(failure) => {
                warn!("{failure}");
                (failure.page(), RecognitionOutcome::Failure(failure.to_string()))
            }
        };
        outcomes.push(PageOutcome { page, outcome });
    }

    let result = match document.kind() {
        DocumentKind::Image => assemble_image(outcomes)?,
        DocumentKind::Pdf => assemble_pdf(outcomes),
    };

    info!(
        pages = result.page_count,
        with_text = result.pages_with_text,
        "document processed"
    );
    Ok(result)
}

/// Single-image assembly: the one outcome is the whole result verbatim, no
/// page banner. An engine-reported failure here has nothing to degrade to,
/// so it fails the request.
fn assemble_image(outcomes: Vec<PageOutcome>) -> Result<OcrOutcome, OcrError> {
    let outcome = outcomes
        .first()
        .map(|o| o.outcome.clone())
        .ok_or_else(|| OcrError::Internal("image input produced no page".into()))?;

    match outcome {
        RecognitionOutcome::Text(text) => {
            let has_text = !text.trim().is_empty();
            let rendered = if has_text {
                text
            } else {
                "No text detected in the image.".to_string()
            };
            Ok(OcrOutcome {
                text: rendered,
                page_count: 1,
                pages_with_text: usize::from(has_text),
                pages: outcomes,
            })
        }
        RecognitionOutcome::Failure(reason) => Err(OcrError::Engine { detail: reason }),
    }
}

/// Multi-page assembly: every page gets a banner, in document order,
/// regardless of page count. No-text pages and failed pages are annotated
/// in-band rather than dropped, so provenance survives partial failure.
fn assemble_pdf(outcomes: Vec<PageOutcome>) -> OcrOutcome {
    let mut text = String::new();
    let mut pages_with_text = 0;

    for entry in &outcomes {
        text.push_str(&page_banner(entry.page));
        match &entry.outcome {
            RecognitionOutcome::Text(page_text) if !page_text.trim().is_empty() => {
                pages_with_text += 1;
                text.push_str(page_text);
            }
            RecognitionOutcome::Text(_) => {
                text.push_str("No text detected on this page.");
            }
            RecognitionOutcome::Failure(reason) => {
                text.push_str(&format!("Recognition failed for this page: {reason}"));
            }
        }
        text.push_str("\n\n");
    }

    if text.is_empty() {
        text = "No text detected in the PDF.".to_string();
    }

    OcrOutcome {
        page_count: outcomes.len(),
        pages_with_text,
        text,
        pages: outcomes,
    }
}
