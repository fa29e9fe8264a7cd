//! Recognition client: submit one page image to the external OCR engine.
//!
//! This module is intentionally thin — a capability wrapper around the
//! Google Cloud Vision `images:annotate` REST call. It distinguishes two
//! failure planes:
//!
//! * the engine answered but reported an error for the image → a
//!   [`RecognitionOutcome::Failure`], absorbed per page by the aggregator;
//! * the engine could not be reached, rejected the credentials, or returned
//!   an undecodable body → [`OcrError::Engine`], fatal to the request.
//!
//! No automatic retry is performed anywhere in this module; the observed
//! behaviour had none and the simplicity is kept on purpose.

use crate::config::OcrConfig;
use crate::error::OcrError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Which of the engine's two detection models to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Scene-text detection, suited to standalone photos and screenshots.
    PlainText,
    /// Dense-layout detection, suited to scanned document pages.
    Document,
}

impl DetectionMode {
    /// Feature name on the engine's wire protocol.
    fn feature(self) -> &'static str {
        match self {
            DetectionMode::PlainText => "TEXT_DETECTION",
            DetectionMode::Document => "DOCUMENT_TEXT_DETECTION",
        }
    }
}

/// What recognition produced for one page. Exactly one variant holds.
///
/// "The engine found no text" is `Text("")`, not a failure — absence of
/// text is a valid outcome, and the aggregator owns the user-facing wording
/// for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Extracted text, possibly empty when the engine found none.
    Text(String),
    /// The engine processed the request but reported an error for this
    /// image (e.g. malformed content).
    Failure(String),
}

/// The single external-network capability of the pipeline.
///
/// One long-lived handle is constructed at process start and injected via
/// application state; tests substitute their own implementation.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognise text in one page image. The language hint is fixed at
    /// construction; `mode` varies per document kind.
    async fn recognize(
        &self,
        image: &[u8],
        mode: DetectionMode,
    ) -> Result<RecognitionOutcome, OcrError>;
}

// ── Google Cloud Vision implementation ───────────────────────────────────

/// Recognition client backed by the Google Cloud Vision REST API.
pub struct GoogleVision {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    language_hint: String,
}

impl GoogleVision {
    /// Build the long-lived client from configuration.
    ///
    /// Fails when no API key is configured — better to refuse to start than
    /// to 500 on the first upload.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        if config.api_key.is_empty() {
            return Err(OcrError::Engine {
                detail: "GOOGLE_VISION_API_KEY is not set".into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| OcrError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language_hint: config.language_hint.clone(),
        })
    }
}

#[async_trait]
impl TextRecognizer for GoogleVision {
    async fn recognize(
        &self,
        image: &[u8],
        mode: DetectionMode,
    ) -> Result<RecognitionOutcome, OcrError> {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    r#type: mode.feature(),
                }],
                image_context: ImageContext {
                    language_hints: vec![self.language_hint.as_str()],
                },
            }],
        };

        let url = format!("{}/v1/images:annotate", self.endpoint);
        debug!(mode = mode.feature(), bytes = image.len(), "annotate request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::Engine {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "annotate call rejected");
            return Err(OcrError::Engine {
                detail: format!("HTTP {status}: {detail}"),
            });
        }

        let decoded: AnnotateResponse = response.json().await.map_err(|e| OcrError::Engine {
            detail: format!("undecodable engine response: {e}"),
        })?;

        let first = decoded.responses.into_iter().next().unwrap_or_default();
        Ok(interpret(first, mode))
    }
}

/// Turn one decoded engine response into an outcome.
///
/// An engine-reported `error.message` is a per-page failure; a missing
/// annotation is empty text, not an error.
fn interpret(response: ImageResponse, mode: DetectionMode) -> RecognitionOutcome {
    if let Some(error) = response.error {
        return RecognitionOutcome::Failure(format!("API Error: {}", error.message));
    }

    let text = match mode {
        DetectionMode::Document => response
            .full_text_annotation
            .map(|a| a.text)
            .or_else(|| first_description(response.text_annotations)),
        DetectionMode::PlainText => first_description(response.text_annotations)
            .or_else(|| response.full_text_annotation.map(|a| a.text)),
    };

    RecognitionOutcome::Text(text.unwrap_or_default())
}

/// The first `textAnnotations` entry carries the whole image's text.
fn first_description(annotations: Vec<TextAnnotation>) -> Option<String> {
    annotations.into_iter().next().map(|a| a.description)
}

// ── Wire types (owned by the engine; only the fields we read/write) ──────

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
    image_context: ImageContext<'a>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    r#type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: Vec<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageResponse {
    error: Option<EngineStatus>,
    full_text_annotation: Option<FullTextAnnotation>,
    text_annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct EngineStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}
