//! Submission handler: one uploaded image in, at most one outcome out.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::chat::{ChatSession, GenerativeModel, Part};
use crate::media::UploadedImage;

/// Fixed instruction sent ahead of every image.
pub const ANALYSIS_PROMPT: &str = "Analyze this medical image and provide insights.";

pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image before generating analysis.";
pub const INVALID_IMAGE_MESSAGE: &str =
    "The uploaded file is not a readable PNG or JPEG image. Accepted formats: PNG, JPG, JPEG.";
pub const REQUEST_FAILED_MESSAGE: &str =
    "The analysis service could not process this request. Please try again.";

/// Raw upload as received from the user.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

impl Upload {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
        }
    }

    /// An empty file part counts as no upload at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AnalysisResult {
    Success { text: String },
    ValidationError { message: String },
    RequestError { message: String },
}

impl AnalysisResult {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ValidationError { .. } => "validation-error",
            Self::RequestError { .. } => "request-error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn validation(message: &str) -> Self {
        Self::ValidationError {
            message: message.to_string(),
        }
    }
}

/// What the caller renders: the result plus the image that was submitted.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub image: Option<UploadedImage>,
    pub result: AnalysisResult,
}

/// Owns one conversation and turns submissions into outcomes.
pub struct SubmissionHandler {
    session: ChatSession,
}

impl SubmissionHandler {
    /// Start a handler with a fresh, empty session.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            session: ChatSession::new(model),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Handle one trigger event.
    ///
    /// Returns `None` when `trigger` is false. Never returns an error: every
    /// failure is mapped to a renderable [`AnalysisResult`].
    pub async fn handle_submission(&mut self, trigger: bool, upload: Option<Upload>) -> Option<Outcome> {
        if !trigger {
            return None;
        }

        let Some(upload) = upload.filter(|u| !u.is_empty()) else {
            return Some(Outcome {
                image: None,
                result: AnalysisResult::validation(MISSING_IMAGE_MESSAGE),
            });
        };

        let image = match UploadedImage::decode(&upload.bytes, upload.filename.as_deref()) {
            Ok(image) => image,
            Err(e) => {
                warn!(filename = ?upload.filename, size = upload.bytes.len(), error = %e, "Rejected upload");
                return Some(Outcome {
                    image: None,
                    result: AnalysisResult::validation(INVALID_IMAGE_MESSAGE),
                });
            }
        };

        let parts = vec![
            Part::text(ANALYSIS_PROMPT),
            Part::inline_data(image.mime_type(), image.to_base64()),
        ];

        info!(
            filename = ?image.filename(),
            mime_type = %image.mime_type(),
            size = image.bytes().len(),
            "Submitting image for analysis"
        );

        let result = match self.session.send_message(parts).await {
            Ok(text) => AnalysisResult::Success { text },
            Err(e) => {
                error!(error = %e, detail = ?e, "Analysis request failed");
                AnalysisResult::RequestError {
                    message: REQUEST_FAILED_MESSAGE.to_string(),
                }
            }
        };

        Some(Outcome {
            image: Some(image),
            result,
        })
    }
}
