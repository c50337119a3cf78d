//! Image encoding: `RgbImage` → JPEG/PNG bytes, and bytes → data URL.
//!
//! Vision-model APIs accept images as base64 data URLs inside the JSON
//! request body. The rectifier always re-encodes, even when nothing was
//! warped or resized, so callers get a predictable codec and MIME type no
//! matter what was uploaded.

use crate::config::OutputFormat;
use crate::error::RectifyError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Encode `img` in the requested format.
///
/// `jpeg_quality` is clamped to 1–100 and ignored for PNG.
pub fn encode_image(
    img: &RgbImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RectifyError> {
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality.clamp(1, 100)).encode_image(img)
        }
        OutputFormat::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
    };
    result.map_err(|e| RectifyError::Encode {
        format: format.name(),
        detail: e.to_string(),
    })?;

    debug!(format = format.name(), bytes = buf.len(), "Encoded image");
    Ok(buf)
}

/// Wrap encoded bytes as `data:<mime>;base64,<payload>`.
pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
