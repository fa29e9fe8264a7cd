//! # tahrir-ocr
//!
//! Document OCR service: accept an uploaded image or multi-page PDF and
//! return its extracted text, biased toward Arabic, by delegating
//! recognition to the Google Cloud Vision API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Gatekeep  validate size/extension, materialise a scoped temp file
//!  ├─ 2. Raster    image → identity; PDF → per-page PNG via pdfium (spawn_blocking)
//!  ├─ 3. Recognize one engine call per page, Arabic language hint
//!  ├─ 4. Assemble  "--- Page N ---" banners, per-page failure annotations
//!  └─ 5. Respond   JSON {success, markdown, page_count} or a .txt download
//! ```
//!
//! A single bad page of a PDF degrades the result (it becomes an in-band
//! annotation); it never aborts the document. Rasterisation failure and
//! engine transport failure are fatal. Temporary files are removed on every
//! exit path, including request cancellation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tahrir_ocr::{routes, AppState, GoogleVision, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::from_env()?;
//!     let recognizer = Arc::new(GoogleVision::new(&config)?);
//!     let app = routes::router(AppState::new(recognizer, config));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrConfig, OcrConfigBuilder, ServerConfig, ALLOWED_EXTENSIONS};
pub use error::{OcrError, PageFailure};
pub use output::{OcrOutcome, OcrResponse, PageOutcome};
pub use pipeline::process::process;
pub use pipeline::raster::{PageImage, PageStream};
pub use pipeline::recognize::{DetectionMode, GoogleVision, RecognitionOutcome, TextRecognizer};
pub use state::AppState;
pub use upload::{DocumentKind, UploadedDocument};
