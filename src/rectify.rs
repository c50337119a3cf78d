//! Rectification entry points.
//!
//! [`rectify`] is the core operation over in-memory bytes. The `*_file`
//! variants add path handling around it for the CLI and for batch scripts.
//!
//! ```text
//! bytes ─▶ decode ─▶ fit long edge ─▶ detect? ─┬─ quad ─▶ warp ─┬─▶ encode
//!                                             └─ none ─────────┘
//! ```
//!
//! Only decoding and encoding can fail. When detection or the warp comes up
//! empty the resized photo is encoded as-is and `did_rectify` is `false`;
//! a vision model reads an unflattened receipt far better than no receipt.

use crate::config::RectifyConfig;
use crate::error::RectifyError;
use crate::output::{RectificationResult, RectificationSummary};
use crate::pipeline::{decode, detect, encode, geometry, warp};
use image::RgbImage;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info};

/// Normalise a photographed receipt.
///
/// # Errors
/// - [`RectifyError::Decode`] if `bytes` is not a decodable image
/// - [`RectifyError::Encode`] if the final encode fails
///
/// Boundary-detection problems are never errors; see the module docs.
pub fn rectify(bytes: &[u8], config: &RectifyConfig) -> Result<RectificationResult, RectifyError> {
    let decoded = decode::decode_rgb(bytes)?;
    let working = decode::fit_long_edge(decoded, config.max_long_edge.max(1));

    let (image, did_rectify) = match straighten(&working) {
        Some(flat) => (flat, true),
        None => (working, false),
    };

    let format = config.output_format;
    let bytes = encode::encode_image(&image, format, config.jpeg_quality)?;
    let (width, height) = image.dimensions();

    info!(
        did_rectify,
        width,
        height,
        format = format.name(),
        "Receipt normalised"
    );

    Ok(RectificationResult {
        bytes,
        mime: format.mime_type(),
        did_rectify,
        width,
        height,
    })
}

/// Detect the document and warp it flat, or `None` to keep the photo as-is.
fn straighten(image: &RgbImage) -> Option<RgbImage> {
    let quad = detect::detect_document(image)?;
    let ordered = geometry::order_points(&quad);
    debug!(?ordered, "Corners ordered");
    warp::warp_to_rectangle(image, &ordered)
}

/// Read an image file and [`rectify`] it.
pub fn rectify_file(
    path: impl AsRef<Path>,
    config: &RectifyConfig,
) -> Result<RectificationResult, RectifyError> {
    let bytes = read_image_file(path.as_ref())?;
    rectify(&bytes, config)
}

/// Rectify `input` and write the encoded image to `output`.
///
/// The write is atomic: bytes go to a temporary file in the destination
/// directory which is then renamed over `output`, so readers never observe a
/// half-written image. Parent directories are created as needed.
pub fn rectify_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &RectifyConfig,
) -> Result<RectificationSummary, RectifyError> {
    let result = rectify_file(input, config)?;
    write_atomic(output.as_ref(), &result.bytes)?;
    debug!(path = %output.as_ref().display(), "Wrote rectified image");
    Ok(result.summary())
}

fn read_image_file(path: &Path) -> Result<Vec<u8>, RectifyError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RectifyError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => RectifyError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RectifyError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RectifyError> {
    let write_err = |source: std::io::Error| RectifyError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
