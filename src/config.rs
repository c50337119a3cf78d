//! Configuration types for receipt rectification.
//!
//! All rectifier behaviour is controlled through [`RectifyConfig`], built via
//! its [`RectifyConfigBuilder`]. Only the *outer* knobs are configurable
//! (size cap, output codec, JPEG quality). The detection constants in
//! [`crate::pipeline::detect`] are fixed so that outputs stay reproducible
//! across deployments.

use crate::error::RectifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cap on the longest image edge, in pixels.
pub const DEFAULT_MAX_LONG_EDGE: u32 = 2000;

/// Default JPEG quality factor (1–100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Configuration for a single rectification call.
///
/// # Example
/// ```rust
/// use receipt_prep::{OutputFormat, RectifyConfig};
///
/// let config = RectifyConfig::builder()
///     .max_long_edge(1600)
///     .output_format(OutputFormat::Png)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_format.mime_type(), "image/png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectifyConfig {
    /// Maximum width or height of the working image. Default: 2000.
    ///
    /// Larger photos are downscaled (area averaging) before edge detection;
    /// smaller ones are left at their native size. Phone cameras routinely
    /// produce 4000 px images, far beyond what a vision model can use, and
    /// Canny on a 12 MP image is both slow and noisier.
    pub max_long_edge: u32,

    /// Codec for the re-encoded output. Default: [`OutputFormat::Jpeg`].
    pub output_format: OutputFormat,

    /// JPEG quality factor, 1–100. Ignored for PNG. Default: 85.
    pub jpeg_quality: u8,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            max_long_edge: DEFAULT_MAX_LONG_EDGE,
            output_format: OutputFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RectifyConfig {
    /// Create a new builder for `RectifyConfig`.
    pub fn builder() -> RectifyConfigBuilder {
        RectifyConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RectifyConfig`].
#[derive(Debug)]
pub struct RectifyConfigBuilder {
    config: RectifyConfig,
}

impl RectifyConfigBuilder {
    pub fn max_long_edge(mut self, px: u32) -> Self {
        self.config.max_long_edge = px;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RectifyConfig, RectifyError> {
        let c = &self.config;
        if c.max_long_edge == 0 {
            return Err(RectifyError::InvalidConfig(
                "max_long_edge must be ≥ 1".into(),
            ));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(RectifyError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output codec for the rectified image.
///
/// JPEG keeps uploads small for the model API; PNG is lossless and is the
/// better choice when the receipt print is faint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// MIME type reported alongside the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Short codec name used in log lines and error messages.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_settings() {
        let c = RectifyConfig::default();
        assert_eq!(c.max_long_edge, 2000);
        assert_eq!(c.output_format, OutputFormat::Jpeg);
        assert_eq!(c.jpeg_quality, 85);
    }

    #[test]
    fn builder_clamps_quality() {
        let c = RectifyConfig::builder().jpeg_quality(0).build().unwrap();
        assert_eq!(c.jpeg_quality, 1);
        let c = RectifyConfig::builder().jpeg_quality(255).build().unwrap();
        assert_eq!(c.jpeg_quality, 100);
    }

    #[test]
    fn builder_rejects_zero_edge() {
        let err = RectifyConfig::builder().max_long_edge(0).build().unwrap_err();
        assert!(matches!(err, RectifyError::InvalidConfig(_)));
    }

    #[test]
    fn format_mime_and_extension() {
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.to_string(), "PNG");
    }

    #[test]
    fn format_serde_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Png).unwrap();
        assert_eq!(json, "\"png\"");
        let back: OutputFormat = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(back, OutputFormat::Jpeg);
    }
}
