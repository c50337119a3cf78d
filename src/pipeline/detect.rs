//! Document-boundary detection: find the receipt's outline in a photo.
//!
//! ## Pipeline
//!
//! 1. Grayscale
//! 2. 5×5 Gaussian blur (binomial 1-4-6-4-1 kernel) to suppress sensor noise
//! 3. Canny edge map, thresholds 50 / 150
//!    (`imageproc`'s Canny smooths again with its own σ = 1.4 Gaussian and
//!    thresholds the L2 gradient magnitude, so 50 / 150 here is a little
//!    stricter than the same numbers on a single-blur, L1-gradient Canny)
//! 4. Contour tracing on the edge map; outer borders only
//! 5. Rank contours by enclosed area, keep the 8 largest
//! 6. Walk the ranked list and accept the first contour whose Douglas–Peucker
//!    polygon (tolerance 2 % of perimeter) has exactly four vertices and
//!    encloses more than 12 % of the image
//!
//! Detection is best-effort. [`detect_document`] only ever answers "here is
//! a quadrilateral" or "none found"; the rectifier decides what to do with
//! the latter. The search stops at the first acceptable candidate rather than
//! scoring all of them, so a slightly smaller but cleaner quad further down
//! the ranking never wins over a larger one.

use super::geometry::{approximate_closed_polygon, closed_perimeter, polygon_area, Point2, Quadrilateral};
use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use tracing::debug;

/// Fixed 5-tap Gaussian used for a 5×5 kernel with automatic sigma.
const BLUR_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Canny hysteresis thresholds, applied to `imageproc`'s L2 gradient after
/// its internal σ = 1.4 blur (on top of [`BLUR_KERNEL`]).
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Upper bound on contours examined per image.
const MAX_CANDIDATES: usize = 8;

/// Polygon approximation tolerance as a fraction of contour perimeter.
const APPROX_EPSILON_RATIO: f64 = 0.02;

/// Minimum share of the image a document quad must cover.
const MIN_AREA_RATIO: f64 = 0.12;

/// Why detection came back empty. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectionFailure {
    /// Image too small for a 5×5 blur and Sobel stencil to mean anything.
    TooSmall,
    /// Edge map produced no outer contours at all.
    NoContours,
    /// Contours existed but none approximated to a large enough quad.
    NoQuadrilateral,
}

/// A traced contour with its enclosed area precomputed for ranking.
struct Candidate {
    points: Vec<Point2>,
    area: f64,
}

/// Locate the most likely document quadrilateral in `image`.
///
/// Returns `None` when nothing qualifies; never fails otherwise.
pub fn detect_document(image: &RgbImage) -> Option<Quadrilateral> {
    match try_detect(image) {
        Ok(quad) => {
            debug!(corners = ?quad.points(), area = quad.area(), "Document boundary accepted");
            Some(quad)
        }
        Err(reason) => {
            debug!(?reason, "No document boundary; continuing unwarped");
            None
        }
    }
}

fn try_detect(image: &RgbImage) -> Result<Quadrilateral, DetectionFailure> {
    let (w, h) = image.dimensions();
    if w < 5 || h < 5 {
        return Err(DetectionFailure::TooSmall);
    }

    let edges = edge_map(image);
    let candidates = ranked_candidates(&edges);
    debug!(count = candidates.len(), "Contour candidates ranked");
    if candidates.is_empty() {
        return Err(DetectionFailure::NoContours);
    }

    let min_area = f64::from(w) * f64::from(h) * MIN_AREA_RATIO;
    first_acceptable(&candidates, min_area).ok_or(DetectionFailure::NoQuadrilateral)
}

/// The first candidate, in ranked order, that passes [`accept_candidate`].
fn first_acceptable(ranked: &[Candidate], min_area: f64) -> Option<Quadrilateral> {
    ranked.iter().find_map(|c| accept_candidate(c, min_area))
}

/// Grayscale → 5×5 blur → Canny.
fn edge_map(image: &RgbImage) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let blurred = separable_filter_equal(&gray, &BLUR_KERNEL);
    canny(&blurred, CANNY_LOW, CANNY_HIGH)
}

/// Outer contours sorted by enclosed area (descending), capped at
/// [`MAX_CANDIDATES`]. The sort is stable, so equal areas keep trace order.
fn ranked_candidates(edges: &GrayImage) -> Vec<Candidate> {
    let candidates = find_contours::<u32>(edges)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .map(to_candidate)
        .collect();
    rank(candidates)
}

fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn to_candidate(contour: Contour<u32>) -> Candidate {
    let points: Vec<Point2> = contour
        .points
        .iter()
        .map(|p| Point2::new(f64::from(p.x), f64::from(p.y)))
        .collect();
    let area = polygon_area(&points);
    Candidate { points, area }
}

/// Accept `candidate` if its simplified polygon is a large enough quad.
fn accept_candidate(candidate: &Candidate, min_area: f64) -> Option<Quadrilateral> {
    let epsilon = APPROX_EPSILON_RATIO * closed_perimeter(&candidate.points);
    if epsilon <= 0.0 {
        return None;
    }

    let approx = approximate_closed_polygon(&candidate.points, epsilon);
    let quad = Quadrilateral::from_polygon(&approx)?;
    let area = quad.area();
    if area > min_area {
        Some(quad)
    } else {
        debug!(area, min_area, "Quadrilateral candidate too small");
        None
    }
}
