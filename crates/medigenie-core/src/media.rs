//! Uploaded image validation and re-encoding.
//!
//! Only PNG and JPEG containers are accepted. The container is sniffed from
//! the bytes; the filename is advisory and never decides the MIME type.

use std::fmt;
use std::io::Cursor;

use base64::Engine;
use image::ImageReader;
use tracing::debug;

use crate::error::{MediError, MediResult};

/// Supported upload container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Container name as reported by the decoder.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
        }
    }

    /// MIME type sent with the inline data: `image/<lowercased name>`.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.name().to_lowercase())
    }

    /// Match a file extension (`png`, `jpg`, `jpeg`), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn from_decoder(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn to_decoder(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated image, re-encoded in its original container.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    filename: Option<String>,
}

impl UploadedImage {
    /// Sniff, decode and re-encode raw upload bytes.
    pub fn decode(bytes: &[u8], filename: Option<&str>) -> MediResult<Self> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| MediError::decode(format!("cannot read image: {e}")))?;

        let detected = reader
            .format()
            .ok_or_else(|| MediError::UnsupportedFormat("unrecognized image data".to_string()))?;
        let format = ImageFormat::from_decoder(detected)
            .ok_or_else(|| MediError::UnsupportedFormat(format!("{detected:?}")))?;

        let decoded = reader
            .decode()
            .map_err(|e| MediError::decode(format!("corrupt {format} data: {e}")))?;

        let mut encoded = Vec::with_capacity(bytes.len());
        decoded
            .write_to(&mut Cursor::new(&mut encoded), format.to_decoder())
            .map_err(|e| MediError::decode(format!("cannot re-encode {format}: {e}")))?;

        if let Some(declared) = filename
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| ImageFormat::from_extension(ext))
        {
            if declared != format {
                debug!(filename, %declared, detected = %format, "Extension disagrees with image data");
            }
        }

        debug!(
            format = %format,
            width = decoded.width(),
            height = decoded.height(),
            size = encoded.len(),
            "Image decoded"
        );

        Ok(Self {
            bytes: encoded,
            format,
            filename: filename.map(str::to_string),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn mime_type(&self) -> String {
        self.format.mime_type()
    }

    /// Base64 payload for inline request data.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:` URL for the preview.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}
