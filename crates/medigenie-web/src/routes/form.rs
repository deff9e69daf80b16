//! Multipart submission parsing shared by the page and the API.

use axum::extract::multipart::{Multipart, MultipartError};
use medigenie_core::Upload;
use tracing::debug;

/// File part carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Field sent by the "Generate Analysis" button; its presence is the trigger.
pub const TRIGGER_FIELD: &str = "generate";

/// Parsed submission form.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub trigger: bool,
    pub upload: Option<Upload>,
}

/// Drain the multipart body into a [`SubmissionForm`]. Unknown fields are ignored.
pub async fn read_submission(mut multipart: Multipart) -> Result<SubmissionForm, MultipartError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let bytes = field.bytes().await?;
                debug!(filename = ?filename, size = bytes.len(), "Received image part");
                form.upload = Some(Upload::new(bytes.to_vec(), filename));
            }
            TRIGGER_FIELD => {
                form.trigger = true;
            }
            other => {
                debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}
