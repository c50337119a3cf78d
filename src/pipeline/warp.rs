//! Perspective rectification: flatten an ordered quadrilateral into an
//! axis-aligned rectangle.
//!
//! The four corners map to `(0,0)`, `(w−1,0)`, `(w−1,h−1)`, `(0,h−1)` of a
//! `w × h` canvas sized by [`OrderedQuadrilateral::target_size`]. The
//! homography is solved by `imageproc` from those four correspondences and
//! the source is resampled bilinearly; pixels that map outside the source
//! are filled black.

use super::geometry::OrderedQuadrilateral;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::{debug, warn};

/// Fill colour for destination pixels whose preimage is outside the photo.
const BORDER_FILL: Rgb<u8> = Rgb([0, 0, 0]);

/// Warp the region bounded by `quad` into a top-down rectangle.
///
/// Returns `None` when the corners are degenerate (collinear or repeated)
/// and no projective transform exists, or if the output would be empty.
pub fn warp_to_rectangle(image: &RgbImage, quad: &OrderedQuadrilateral) -> Option<RgbImage> {
    let (out_w, out_h) = quad.target_size();
    let projection = document_projection(quad, out_w, out_h)?;

    let mut output = RgbImage::new(out_w, out_h);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        BORDER_FILL,
        &mut output,
    );

    if output.width() == 0 || output.height() == 0 {
        warn!("Perspective warp produced an empty image");
        return None;
    }

    debug!(out_w, out_h, "Perspective correction applied");
    Some(output)
}

/// Solve the projective transform taking `quad` onto a `w × h` rectangle.
pub fn document_projection(quad: &OrderedQuadrilateral, w: u32, h: u32) -> Option<Projection> {
    let right = w.saturating_sub(1) as f32;
    let bottom = h.saturating_sub(1) as f32;

    let src = quad.corners().map(|p| (p.x as f32, p.y as f32));
    let dst = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    let projection = Projection::from_control_points(src, dst);
    if projection.is_none() {
        warn!(corners = ?src, "Degenerate quadrilateral; no projective transform");
    }
    projection
}
