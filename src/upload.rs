//! Upload gatekeeper: validate an inbound document and materialise it to a
//! scoped temporary file.
//!
//! ## Why a temp file?
//!
//! pdfium requires a file-system path — it cannot stream from a byte buffer.
//! Writing the upload to a [`tempfile::NamedTempFile`] gives the rasteriser a
//! path to open while guaranteeing removal when [`UploadedDocument`] is
//! dropped, on every exit path: success, partial failure, fatal error, or a
//! caller disconnect that cancels the request future. Rejected uploads never
//! reach the temp-file step, so rejection leaves nothing on disk.

use crate::config::{OcrConfig, ALLOWED_EXTENSIONS};
use crate::error::OcrError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// What kind of document the pipeline is dealing with, inferred from the
/// upload extension. Decides both the rasterisation strategy and the
/// recognition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Multi-page PDF: rasterised page by page.
    Pdf,
    /// Still image (jpg/jpeg/png): passed to recognition unchanged.
    Image,
}

impl DocumentKind {
    /// Map a lowercase extension to a kind. `None` for anything outside the
    /// allowed set.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentKind::Pdf),
            "jpg" | "jpeg" | "png" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

/// A validated upload, materialised to a scoped temporary file.
///
/// The temp file preserves the original extension so the rasteriser can
/// dispatch on it. Dropping this struct removes the file.
#[derive(Debug)]
pub struct UploadedDocument {
    file: NamedTempFile,
    kind: DocumentKind,
    file_name: String,
    extension: String,
}

impl UploadedDocument {
    /// Path of the temporary copy.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The filename the client declared for the upload.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lowercased extension of the declared filename.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Declared filename without its extension, for naming derived artifacts.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }
}

/// Validate an upload and write it to a scoped temporary file.
///
/// Rejections (no temp file is created):
/// - empty filename → [`OcrError::Validation`]
/// - size over the configured ceiling → [`OcrError::TooLarge`]
/// - extension outside [`ALLOWED_EXTENSIONS`] (case-insensitive) →
///   [`OcrError::Validation`]
pub fn validate_and_store(
    file_name: &str,
    bytes: &[u8],
    config: &OcrConfig,
) -> Result<UploadedDocument, OcrError> {
    if file_name.is_empty() {
        return Err(OcrError::Validation("No file selected".into()));
    }

    if bytes.len() > config.max_upload_bytes {
        return Err(OcrError::TooLarge {
            limit_mb: (config.max_upload_bytes / (1024 * 1024)) as u64,
        });
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let kind = DocumentKind::from_extension(&extension).ok_or_else(|| {
        OcrError::Validation(format!(
            "File type not allowed. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    let mut file = tempfile::Builder::new()
        .prefix("tahrir-upload-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;

    debug!(
        file_name,
        bytes = bytes.len(),
        temp = %file.path().display(),
        "upload accepted"
    );

    Ok(UploadedDocument {
        file,
        kind,
        file_name: file_name.to_string(),
        extension,
    })
}
