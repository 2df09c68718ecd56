pub mod distance_2d;

pub use distance_2d::{closest_point_on_segment, distance, distance_to_segment};

use std::f64::consts::FRAC_PI_2;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the angle of `v` in radians, measured counter-clockwise from +X.
#[must_use]
pub fn heading_of(v: &Vector2) -> f64 {
    v.y.atan2(v.x)
}

/// Unit vector for a heading in radians.
#[must_use]
pub fn unit_from_heading(heading: f64) -> Vector2 {
    Vector2::new(heading.cos(), heading.sin())
}

/// Heading of the direction indicator drawn on a segment from `start` to `end`.
///
/// The glyph is authored pointing up, so the travel angle is rotated by -90°.
#[must_use]
pub fn indicator_heading(start: &Point2, end: &Point2) -> f64 {
    heading_of(&(end - start)) - FRAC_PI_2
}

/// Evaluates a cubic Bézier curve at `t` in `[0, 1]`.
#[must_use]
pub fn cubic_bezier_point(p0: &Point2, p1: &Point2, p2: &Point2, p3: &Point2, t: f64) -> Point2 {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    Point2::from(p0.coords * b0 + p1.coords * b1 + p2.coords * b2 + p3.coords * b3)
}

/// Wraps an angle into `(-π, π]`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn indicator_heading_of_upward_segment_is_zero() {
        let h = indicator_heading(&Point2::new(0.0, 0.0), &Point2::new(0.0, 10.0));
        assert_abs_diff_eq!(h, 0.0, epsilon = TOLERANCE);
    }

    #[test]
    fn indicator_heading_of_rightward_segment() {
        let h = indicator_heading(&Point2::new(0.0, 0.0), &Point2::new(10.0, 0.0));
        assert_abs_diff_eq!(h, -FRAC_PI_2, epsilon = TOLERANCE);
    }

    #[test]
    fn bezier_hits_endpoints() {
        let p0 = Point2::new(0.0, 0.0);
        let p1 = Point2::new(0.0, 5.0);
        let p2 = Point2::new(10.0, 5.0);
        let p3 = Point2::new(10.0, 0.0);
        assert_abs_diff_eq!(cubic_bezier_point(&p0, &p1, &p2, &p3, 0.0), p0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(cubic_bezier_point(&p0, &p1, &p2, &p3, 1.0), p3, epsilon = TOLERANCE);
        let mid = cubic_bezier_point(&p0, &p1, &p2, &p3, 0.5);
        assert_abs_diff_eq!(mid.x, 5.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(mid.y, 3.75, epsilon = TOLERANCE);
    }

    #[test]
    fn wrap_angle_into_half_open_range() {
        assert_abs_diff_eq!(wrap_angle(2.5 * PI), 0.5 * PI, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_angle(-1.5 * PI), 0.5 * PI, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_angle(0.25), 0.25, epsilon = 1e-12);
    }
}
