//! Shared application state injected into every route handler.

use crate::config::OcrConfig;
use crate::pipeline::recognize::TextRecognizer;
use std::sync::Arc;

/// Application state: the long-lived recognition client handle plus the
/// pipeline configuration.
///
/// The recognizer is constructed once at process start; it holds no
/// per-request data and is safe for concurrent use, so no locking is
/// needed across requests.
#[derive(Clone)]
pub struct AppState {
    pub recognizer: Arc<dyn TextRecognizer>,
    pub config: Arc<OcrConfig>,
}

impl AppState {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: OcrConfig) -> Self {
        Self {
            recognizer,
            config: Arc::new(config),
        }
    }
}
