//! Pipeline stages for document-to-text extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the recognition engine) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ raster ──▶ recognize ──▶ process
//! (temp file) (pages)    (engine)     (assembly)
//! ```
//!
//! 1. [`raster`]    — turn the validated document into an ordered stream of
//!    page images; pdfium work runs in `spawn_blocking` because it is not
//!    async-safe
//! 2. [`recognize`] — submit one page to the external engine; the only stage
//!    with network I/O
//! 3. [`process`]   — drive the two stages page by page and assemble the
//!    labeled text artifact, absorbing per-page failures

pub mod process;
pub mod raster;
pub mod recognize;
