//! Error types for the receipt-prep library.
//!
//! Two error types reflect the two unrelated halves of the crate:
//!
//! * [`RectifyError`]: the image could not be read, decoded, or re-encoded.
//!   Returned as `Err(RectifyError)` from [`crate::rectify()`] and the file
//!   entry points. A failed *boundary detection* is never an error: the
//!   rectifier falls back to the unwarped image and reports
//!   `did_rectify = false` in [`crate::output::RectificationResult`].
//!
//! * [`ExtractError`]: a model reply did not contain a usable JSON object.
//!   Returned from [`crate::json::extract_first_json_object`] and
//!   [`crate::json::parse_model_json`].
//!
//! Neither is retried inside the crate; both are terminal for the call.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors of the rectification pipeline.
#[derive(Debug, Error)]
pub enum RectifyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// The bytes are not a decodable raster image (or an unsupported format).
    #[error("Could not decode image: {detail}")]
    Decode { detail: String },

    /// The encoder rejected the final image.
    #[error("Failed to encode {format}: {detail}")]
    Encode { format: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures while recovering a JSON object from model-generated text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The text contains no `{` at all.
    #[error("Model response did not contain JSON")]
    NoJsonStart,

    /// A `{` was found but the text ended before its matching `}`.
    #[error("Model response contained '{{' but no complete JSON object")]
    UnbalancedJson,

    /// A balanced object was found, but it is not valid JSON for the target type.
    #[error("Model response JSON is invalid: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}
