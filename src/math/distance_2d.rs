use super::Point2;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    nalgebra::distance(a, b)
}

/// Returns the point on the segment `start → end` closest to `point`.
///
/// Projects onto the infinite line and clamps the parameter to `[0, 1]`.
/// A zero-length segment yields `start`.
#[must_use]
pub fn closest_point_on_segment(point: &Point2, start: &Point2, end: &Point2) -> Point2 {
    let d = end - start;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return *start;
    }

    let t = ((point - start).dot(&d) / len_sq).clamp(0.0, 1.0);
    start + d * t
}

/// Returns the minimum distance from `point` to the segment `start → end`.
#[must_use]
pub fn distance_to_segment(point: &Point2, start: &Point2, end: &Point2) -> f64 {
    distance(point, &closest_point_on_segment(point, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-10;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    // ── closest_point_on_segment ──

    #[test]
    fn closest_point_perpendicular_projection() {
        let c = closest_point_on_segment(&p(5.0, 5.0), &p(0.0, 0.0), &p(10.0, 0.0));
        assert_abs_diff_eq!(c, p(5.0, 0.0), epsilon = TOL);
    }

    #[test]
    fn closest_point_clamps_to_start() {
        let c = closest_point_on_segment(&p(-5.0, 0.0), &p(0.0, 0.0), &p(10.0, 0.0));
        assert_abs_diff_eq!(c, p(0.0, 0.0), epsilon = TOL);
    }

    #[test]
    fn closest_point_clamps_to_end() {
        let c = closest_point_on_segment(&p(15.0, 0.0), &p(0.0, 0.0), &p(10.0, 0.0));
        assert_abs_diff_eq!(c, p(10.0, 0.0), epsilon = TOL);
    }

    // ── distance_to_segment ──

    #[test]
    fn segment_dist_perpendicular_projection() {
        // Point (1, 1) to segment (0,0)→(2,0). Closest at (1,0), dist = 1.
        let d = distance_to_segment(&p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_on_segment() {
        let d = distance_to_segment(&p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!(d.abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_degenerate() {
        // Zero-length segment: distance is point-to-point.
        let d = distance_to_segment(&p(3.0, 4.0), &p(0.0, 0.0), &p(0.0, 0.0));
        assert!((d - 5.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn distance_is_euclidean() {
        assert_abs_diff_eq!(distance(&p(1.0, 1.0), &p(4.0, 5.0)), 5.0, epsilon = TOL);
    }
}
