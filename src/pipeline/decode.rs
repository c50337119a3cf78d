//! Decoding and size normalisation.
//!
//! Any format the `image` crate was built with (JPEG and PNG here) decodes
//! into an 8-bit RGB buffer; alpha is dropped and grayscale is expanded.
//! Oversized photos are then shrunk so the longest edge fits the configured
//! cap. Shrinking uses area averaging, where every source pixel contributes
//! to exactly one output pixel, which keeps thin receipt print from aliasing
//! into false edges.

use crate::error::RectifyError;
use image::imageops;
use image::RgbImage;
use tracing::debug;

/// Decode `bytes` into an RGB raster.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, RectifyError> {
    let img = image::load_from_memory(bytes).map_err(|e| RectifyError::Decode {
        detail: e.to_string(),
    })?;
    debug!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Decoded image"
    );
    Ok(img.into_rgb8())
}

/// Factor that brings the longest edge down to `max_long_edge`, never above 1.
pub fn downscale_factor(width: u32, height: u32, max_long_edge: u32) -> f64 {
    let long_edge = width.max(height);
    if long_edge == 0 {
        return 1.0;
    }
    (f64::from(max_long_edge) / f64::from(long_edge)).min(1.0)
}

/// Shrink `img` so neither edge exceeds `max_long_edge`. Never upscales.
pub fn fit_long_edge(img: RgbImage, max_long_edge: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let scale = downscale_factor(w, h, max_long_edge);
    if scale >= 1.0 {
        return img;
    }

    // Integer floor of `edge * scale`; the long edge lands exactly on the cap.
    let long_edge = u64::from(w.max(h));
    let shrink = |edge: u32| ((u64::from(edge) * u64::from(max_long_edge) / long_edge) as u32).max(1);
    let (new_w, new_h) = (shrink(w), shrink(h));
    debug!(scale, from = ?(w, h), to = ?(new_w, new_h), "Downscaling");
    imageops::thumbnail(&img, new_w, new_h)
}
