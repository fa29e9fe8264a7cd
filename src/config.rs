//! Configuration for the OCR pipeline and the HTTP server.
//!
//! All pipeline behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`] or loaded from the environment. Keeping every knob in
//! one struct makes it trivial to share across requests and to diff two
//! deployments to understand why their outputs differ.

use crate::error::OcrError;
use std::env;

/// Upload extensions the gatekeeper accepts, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Configuration for the document-to-text pipeline.
///
/// # Example
/// ```rust
/// use tahrir_ocr::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .dpi(300)
///     .max_upload_bytes(50 * 1024 * 1024)
///     .language_hint("ar")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Upload size ceiling in bytes. Default: 10 MiB.
    ///
    /// Deployments have run with both 10 MB and 50 MB ceilings; it is a
    /// single configurable limit, not two modes.
    pub max_upload_bytes: usize,

    /// Rendering DPI for PDF-derived pages. Range: 72–600. Default: 300.
    ///
    /// 300 DPI keeps small Arabic diacritics legible to the engine while the
    /// PNG per page stays within its upload limits.
    pub dpi: u32,

    /// Language hint passed on every recognition call. Default: `"ar"`.
    pub language_hint: String,

    /// Base URL of the recognition engine REST endpoint.
    pub endpoint: String,

    /// API key for the recognition engine.
    pub api_key: String,

    /// Per-recognition-call timeout in seconds. Default: 180.
    ///
    /// Document-mode calls on dense scans have historically taken minutes;
    /// the ceiling matches the longest observed deployment timeout.
    pub api_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            dpi: 300,
            language_hint: "ar".to_string(),
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key: String::new(),
            api_timeout_secs: 180,
        }
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `GOOGLE_VISION_API_KEY`, `GOOGLE_VISION_ENDPOINT`,
    /// `OCR_MAX_UPLOAD_BYTES`, `OCR_DPI`, `OCR_LANGUAGE_HINT`,
    /// `OCR_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, OcrError> {
        let defaults = Self::default();
        let mut builder = Self::builder();

        if let Ok(bytes) = env::var("OCR_MAX_UPLOAD_BYTES") {
            let bytes = bytes.parse().map_err(|_| {
                OcrError::Validation(format!("OCR_MAX_UPLOAD_BYTES is not a number: {bytes}"))
            })?;
            builder = builder.max_upload_bytes(bytes);
        }
        if let Ok(dpi) = env::var("OCR_DPI") {
            let dpi = dpi
                .parse()
                .map_err(|_| OcrError::Validation(format!("OCR_DPI is not a number: {dpi}")))?;
            builder = builder.dpi(dpi);
        }
        if let Ok(hint) = env::var("OCR_LANGUAGE_HINT") {
            builder = builder.language_hint(hint);
        }
        if let Ok(secs) = env::var("OCR_API_TIMEOUT_SECS") {
            let secs = secs.parse().map_err(|_| {
                OcrError::Validation(format!("OCR_API_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            builder = builder.api_timeout_secs(secs);
        }

        builder = builder.endpoint(
            env::var("GOOGLE_VISION_ENDPOINT").unwrap_or(defaults.endpoint),
        );
        builder = builder.api_key(env::var("GOOGLE_VISION_API_KEY").unwrap_or_default());

        builder.build()
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn language_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.language_hint = hint.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(OcrError::Validation(
                "Upload size ceiling must be non-zero".into(),
            ));
        }
        if c.language_hint.is_empty() {
            return Err(OcrError::Validation("Language hint must not be empty".into()));
        }
        if c.endpoint.is_empty() {
            return Err(OcrError::Validation(
                "Recognition engine endpoint must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Bind address for the HTTP server, read from `HOST`/`PORT`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}
