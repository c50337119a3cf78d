//! Plane geometry for document boundaries: points, quadrilaterals, polygon
//! measures and closed-curve simplification.
//!
//! Everything here is `f64` and allocation-light; contour pixels from
//! `imageproc` are converted once at the detection boundary.

use serde::{Deserialize, Serialize};

/// A point in image space (x grows right, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Four candidate corners in whatever order the detector produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral(pub [Point2; 4]);

impl Quadrilateral {
    /// Build from a polygon that has exactly four vertices.
    pub fn from_polygon(points: &[Point2]) -> Option<Self> {
        <[Point2; 4]>::try_from(points).ok().map(Self)
    }

    pub fn points(&self) -> &[Point2; 4] {
        &self.0
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.0)
    }
}

/// Corners in canonical order: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedQuadrilateral {
    pub tl: Point2,
    pub tr: Point2,
    pub br: Point2,
    pub bl: Point2,
}

impl OrderedQuadrilateral {
    /// Corners as an array in `tl, tr, br, bl` order.
    pub fn corners(&self) -> [Point2; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    /// Size of the axis-aligned rectangle this quadrilateral flattens into.
    ///
    /// Width is the longer of the top and bottom edges, height the longer of
    /// the left and right edges, each rounded and at least 1 px. Taking the
    /// maxima keeps the document's own aspect rather than a fixed paper ratio.
    pub fn target_size(&self) -> (u32, u32) {
        let width = self.br.distance(self.bl).max(self.tr.distance(self.tl));
        let height = self.tr.distance(self.br).max(self.tl.distance(self.bl));
        (round_dimension(width), round_dimension(height))
    }
}

fn round_dimension(length: f64) -> u32 {
    if length.is_finite() {
        (length.round() as u32).max(1)
    } else {
        1
    }
}

/// Order four points as `tl, tr, br, bl` from coordinate sums and differences.
///
/// * smallest `x + y` → top-left, largest `x + y` → bottom-right
/// * smallest `y − x` → top-right, largest `y − x` → bottom-left
///
/// Only the coordinates matter, so the result is the same whatever vertex the
/// contour walk started from and whichever way it wound. Ties resolve to the
/// earliest point in the input.
pub fn order_points(quad: &Quadrilateral) -> OrderedQuadrilateral {
    let pts = quad.points();
    let sum = |p: &Point2| p.x + p.y;
    let diff = |p: &Point2| p.y - p.x;

    OrderedQuadrilateral {
        tl: *arg_extreme(pts, sum, |a, b| a < b),
        tr: *arg_extreme(pts, diff, |a, b| a < b),
        br: *arg_extreme(pts, sum, |a, b| a > b),
        bl: *arg_extreme(pts, diff, |a, b| a > b),
    }
}

fn arg_extreme<'a>(
    pts: &'a [Point2; 4],
    key: impl Fn(&Point2) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> &'a Point2 {
    let mut best = &pts[0];
    let mut best_key = key(best);
    for p in &pts[1..] {
        let k = key(p);
        if better(k, best_key) {
            best = p;
            best_key = k;
        }
    }
    best
}

/// Area enclosed by a closed polygon (shoelace formula), always non-negative.
///
/// Returns 0.0 for fewer than three vertices.
pub fn polygon_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice.abs() / 2.0
}

/// Length of a closed polygon, including the closing edge.
pub fn closed_perimeter(points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len();
    (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .sum()
}

/// Simplify a closed curve with Douglas–Peucker.
///
/// The curve is cut at two far-apart points: `a`, the point farthest from
/// the first point, and `b`, the point farthest from `a`. Each of the two
/// arcs between them is simplified as an open chain and the arcs are
/// rejoined. The first point of the input is therefore never forced into
/// the result, which matters because contour tracing starts wherever the
/// raster scan first touches the curve, often partway along an edge.
///
/// The returned polygon starts at `a` and does not repeat its first vertex.
pub fn approximate_closed_polygon(points: &[Point2], epsilon: f64) -> Vec<Point2> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        return vec![points[a]];
    }

    let mut polygon = simplify_open(&cyclic_arc(points, a, b), epsilon);
    polygon.pop();
    let mut tail = simplify_open(&cyclic_arc(points, b, a), epsilon);
    tail.pop();
    polygon.extend(tail);

    polygon.dedup();
    polygon
}

/// Index of the point farthest from `origin`; the earliest wins ties.
fn farthest_from(points: &[Point2], origin: Point2) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MIN;
    for (i, p) in points.iter().enumerate() {
        let d = origin.distance(*p);
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Points from index `from` forward to `to` inclusive, wrapping at the end.
fn cyclic_arc(points: &[Point2], from: usize, to: usize) -> Vec<Point2> {
    let n = points.len();
    let len = (to + n - from) % n + 1;
    (0..len).map(|k| points[(from + k) % n]).collect()
}

/// Douglas–Peucker on an open chain; both endpoints are always kept.
fn simplify_open(points: &[Point2], epsilon: f64) -> Vec<Point2> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let d = distance_to_line(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
///
/// Falls back to the point distance when `a` and `b` coincide.
fn distance_to_line(p: Point2, a: Point2, b: Point2) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return p.distance(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn skewed_quad() -> [Point2; 4] {
        // tl, tr, br, bl of a perspective-skewed receipt
        [p(40.0, 30.0), p(260.0, 55.0), p(280.0, 410.0), p(20.0, 380.0)]
    }

    #[test]
    fn shoelace_area_rectangle() {
        let rect = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 5.0), p(0.0, 5.0)];
        assert!((polygon_area(&rect) - 50.0).abs() < 1e-9);
        let mut reversed = rect;
        reversed.reverse();
        assert!((polygon_area(&reversed) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn area_of_degenerate_polygon_is_zero() {
        assert_eq!(polygon_area(&[p(0.0, 0.0), p(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn perimeter_includes_closing_edge() {
        let rect = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 5.0), p(0.0, 5.0)];
        assert!((closed_perimeter(&rect) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn order_points_axis_aligned() {
        let quad = Quadrilateral([p(10.0, 90.0), p(100.0, 90.0), p(10.0, 10.0), p(100.0, 10.0)]);
        let o = order_points(&quad);
        assert_eq!(o.tl, p(10.0, 10.0));
        assert_eq!(o.tr, p(100.0, 10.0));
        assert_eq!(o.br, p(100.0, 90.0));
        assert_eq!(o.bl, p(10.0, 90.0));
    }

    #[test]
    fn order_points_ignores_start_vertex_and_winding() {
        let base = skewed_quad();
        let expected = order_points(&Quadrilateral(base));
        assert_eq!(expected.corners(), base);

        for shift in 0..4 {
            let mut cw = base;
            cw.rotate_left(shift);
            assert_eq!(order_points(&Quadrilateral(cw)), expected, "cw shift {shift}");

            let mut ccw = cw;
            ccw.reverse();
            assert_eq!(order_points(&Quadrilateral(ccw)), expected, "ccw shift {shift}");
        }
    }

    #[test]
    fn target_size_uses_longest_edges() {
        let o = order_points(&Quadrilateral(skewed_quad()));
        let (w, h) = o.target_size();
        let top = p(40.0, 30.0).distance(p(260.0, 55.0));
        let bottom = p(280.0, 410.0).distance(p(20.0, 380.0));
        assert_eq!(w, top.max(bottom).round() as u32);
        let right = p(260.0, 55.0).distance(p(280.0, 410.0));
        let left = p(40.0, 30.0).distance(p(20.0, 380.0));
        assert_eq!(h, right.max(left).round() as u32);
    }

    #[test]
    fn target_size_is_at_least_one() {
        let collapsed = OrderedQuadrilateral {
            tl: p(5.0, 5.0),
            tr: p(5.0, 5.0),
            br: p(5.0, 5.0),
            bl: p(5.0, 5.0),
        };
        assert_eq!(collapsed.target_size(), (1, 1));
    }

    #[test]
    fn approximate_dense_rectangle_to_four_vertices() {
        // Walk the border of a 100x60 rectangle one pixel at a time.
        let mut curve = Vec::new();
        for x in 0..100 {
            curve.push(p(x as f64, 0.0));
        }
        for y in 0..60 {
            curve.push(p(100.0, y as f64));
        }
        for x in (1..=100).rev() {
            curve.push(p(x as f64, 60.0));
        }
        for y in (1..=60).rev() {
            curve.push(p(0.0, y as f64));
        }

        let eps = 0.02 * closed_perimeter(&curve);
        let approx = approximate_closed_polygon(&curve, eps);
        assert_eq!(approx.len(), 4, "got {approx:?}");
        assert!((polygon_area(&approx) - 6000.0).abs() < 1.0);
    }

    /// Border of a `w`×`h` rectangle walked clockwise from `(start_x, 0)`.
    fn rectangle_walk_from(w: i32, h: i32, start_x: i32) -> Vec<Point2> {
        let mut curve = Vec::new();
        for x in start_x..w {
            curve.push(p(x as f64, 0.0));
        }
        for y in 0..h {
            curve.push(p(w as f64, y as f64));
        }
        for x in (1..=w).rev() {
            curve.push(p(x as f64, h as f64));
        }
        for y in (1..=h).rev() {
            curve.push(p(0.0, y as f64));
        }
        for x in 0..start_x {
            curve.push(p(x as f64, 0.0));
        }
        curve
    }

    #[test]
    fn approximate_drops_start_point_on_an_edge() {
        let curve = rectangle_walk_from(100, 60, 40);
        assert_eq!(curve[0], p(40.0, 0.0));

        let approx = approximate_closed_polygon(&curve, 0.02 * closed_perimeter(&curve));
        assert_eq!(approx.len(), 4, "got {approx:?}");
        for corner in [p(0.0, 0.0), p(100.0, 0.0), p(100.0, 60.0), p(0.0, 60.0)] {
            assert!(approx.contains(&corner), "missing {corner:?} in {approx:?}");
        }
    }

    #[test]
    fn approximate_is_independent_of_walk_start() {
        for start_x in [0, 1, 25, 50, 75, 99] {
            let curve = rectangle_walk_from(100, 60, start_x);
            let approx = approximate_closed_polygon(&curve, 0.02 * closed_perimeter(&curve));
            assert_eq!(approx.len(), 4, "start {start_x}: {approx:?}");
            assert!((polygon_area(&approx) - 6000.0).abs() < 1.0, "start {start_x}");
        }
    }

    #[test]
    fn cyclic_arc_wraps() {
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)];
        assert_eq!(cyclic_arc(&pts, 2, 1), vec![pts[2], pts[3], pts[0], pts[1]]);
        assert_eq!(cyclic_arc(&pts, 1, 2), vec![pts[1], pts[2]]);
    }

    #[test]
    fn approximate_keeps_small_curves() {
        let tri = vec![p(0.0, 0.0), p(4.0, 0.0), p(0.0, 3.0)];
        assert_eq!(approximate_closed_polygon(&tri, 1.0), tri);
    }

    #[test]
    fn quadrilateral_from_polygon_requires_four() {
        assert!(Quadrilateral::from_polygon(&skewed_quad()).is_some());
        assert!(Quadrilateral::from_polygon(&skewed_quad()[..3]).is_none());
    }

    #[test]
    fn distance_to_line_handles_coincident_endpoints() {
        let d = distance_to_line(p(3.0, 4.0), p(0.0, 0.0), p(0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }
}
