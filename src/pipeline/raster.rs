//! Page rasterisation: normalise a document into an ordered stream of page
//! images.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread-pool thread so the Tokio workers never stall during CPU-heavy
//! rendering.
//!
//! ## Why a bounded channel?
//!
//! A 200-page scan at 300 DPI decodes to hundreds of megabytes if every page
//! is rendered up front. The producer sends each encoded page through a
//! capacity-1 channel, so rendering of page N+1 cannot run ahead of the
//! consumer finishing page N. Peak memory stays at roughly two encoded pages
//! no matter how long the document is.

use crate::error::{OcrError, PageFailure};
use crate::upload::{DocumentKind, UploadedDocument};
use futures::Stream;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// One rasterised page, ready for the recognition engine.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page index in document order.
    pub index: usize,
    /// Encoded image bytes: the original upload for image inputs, a PNG
    /// render for PDF-derived pages.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: &'static str,
}

/// A finite, non-restartable stream of page images in document order.
///
/// Items are `Err(PageFailure)` when a single page could not be rendered;
/// the stream itself keeps going — per-page trouble is the consumer's to
/// absorb, not a reason to drop the rest of the document.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageImage, PageFailure>> + Send>>;

/// Normalise a validated document into a page stream plus its page count.
///
/// - Image input: a one-element stream wrapping the original bytes
///   unchanged (no re-encoding), index 1.
/// - PDF input: the document is opened once up front so corrupt or empty
///   files fail the request with [`OcrError::Conversion`] before any page
///   work starts; pages are then rendered one at a time at `dpi`.
pub async fn page_stream(
    document: &UploadedDocument,
    dpi: u32,
) -> Result<(PageStream, usize), OcrError> {
    match document.kind() {
        DocumentKind::Image => {
            let bytes = tokio::fs::read(document.path()).await?;
            let mime = match document.extension() {
                "png" => "image/png",
                _ => "image/jpeg",
            };
            debug!(bytes = bytes.len(), mime, "image input, single-page stream");
            let page = PageImage {
                index: 1,
                bytes,
                mime,
            };
            Ok((Box::pin(tokio_stream::once(Ok(page))), 1))
        }
        DocumentKind::Pdf => pdf_page_stream(document.path().to_path_buf(), dpi).await,
    }
}

/// Open the PDF, validate it, then stream its pages from a blocking task.
async fn pdf_page_stream(path: PathBuf, dpi: u32) -> Result<(PageStream, usize), OcrError> {
    let total = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || open_and_count(&path))
            .await
            .map_err(|e| OcrError::Internal(format!("Page-count task panicked: {e}")))??
    };
    info!("PDF loaded: {} pages", total);

    let (tx, rx) = mpsc::channel::<Result<PageImage, PageFailure>>(1);
    tokio::task::spawn_blocking(move || render_pages_blocking(&path, dpi, tx));

    Ok((Box::pin(ReceiverStream::new(rx)), total))
}

/// Parse the document and return its page count, rejecting empty documents.
fn open_and_count(path: &Path) -> Result<usize, OcrError> {
    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| OcrError::Conversion {
            detail: format!("{e:?}"),
        })?;
    let total = document.pages().len() as usize;
    if total == 0 {
        return Err(OcrError::Conversion {
            detail: "document has no pages".into(),
        });
    }
    Ok(total)
}

/// Blocking producer: render every page in order and push it through `tx`.
///
/// The document was already validated by [`open_and_count`]; a failure to
/// re-open here just ends the stream early and the consumer sees a shorter
/// document. Individual page failures are sent in-band.
fn render_pages_blocking(path: &Path, dpi: u32, tx: mpsc::Sender<Result<PageImage, PageFailure>>) {
    let pdfium = Pdfium::default();
    let document = match pdfium.load_pdf_from_file(path, None) {
        Ok(d) => d,
        Err(e) => {
            warn!("PDF re-open failed during rasterisation: {e:?}");
            return;
        }
    };

    let scale = dpi as f32 / 72.0;
    for (index, page) in document.pages().iter().enumerate() {
        let number = index + 1;
        let item = render_page(&page, number, scale);
        if tx.blocking_send(item).is_err() {
            debug!("page consumer dropped, stopping rasterisation at page {number}");
            return;
        }
    }
}

/// Render one page at the given scale and encode it as lossless PNG.
fn render_page(page: &PdfPage, number: usize, scale: f32) -> Result<PageImage, PageFailure> {
    let width = (page.width().value * scale).round().max(1.0) as i32;
    let config = PdfRenderConfig::new().set_target_width(width);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PageFailure::Render {
            page: number,
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        number,
        image.width(),
        image.height()
    );

    encode_page(&image, number)
}

/// PNG-encode a rendered page.
///
/// PNG over JPEG: lossless compression preserves stroke edges, and the
/// engine's accuracy on thin Arabic ligatures degrades visibly with
/// compression artefacts.
fn encode_page(image: &DynamicImage, number: usize) -> Result<PageImage, PageFailure> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PageFailure::Encode {
            page: number,
            detail: e.to_string(),
        })?;

    Ok(PageImage {
        index: number,
        bytes: buf,
        mime: "image/png",
    })
}
