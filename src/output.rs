//! Result types returned by the rectifier.

use crate::pipeline::encode::data_url;
use serde::{Deserialize, Serialize};

/// The encoded, normalised image plus what happened to it.
///
/// This is a self-contained value; nothing in it refers back to the buffers
/// used while processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectificationResult {
    /// Encoded image (JPEG or PNG, see `mime`).
    pub bytes: Vec<u8>,
    /// `"image/jpeg"` or `"image/png"`.
    pub mime: &'static str,
    /// Whether a document boundary was found and the image was warped.
    pub did_rectify: bool,
    /// Final image width in pixels.
    pub width: u32,
    /// Final image height in pixels.
    pub height: u32,
}

impl RectificationResult {
    /// `data:` URL ready to embed in a vision-model request.
    pub fn to_data_url(&self) -> String {
        data_url(&self.bytes, self.mime)
    }

    /// Metadata without the image payload.
    pub fn summary(&self) -> RectificationSummary {
        RectificationSummary {
            did_rectify: self.did_rectify,
            width: self.width,
            height: self.height,
            mime: self.mime.to_string(),
            bytes: self.bytes.len(),
        }
    }
}

/// Serialisable description of a [`RectificationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectificationSummary {
    pub did_rectify: bool,
    pub width: u32,
    pub height: u32,
    pub mime: String,
    /// Encoded size in bytes.
    pub bytes: usize,
}
