use crate::manager::PathId;
use crate::math::{closest_point_on_segment, distance, heading_of, Point2, TOLERANCE};

use super::{Direction, EndBehavior, Path};

/// A polyline parameterized by arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point2>,
    /// `cumulative[i]` is the arc length from `points[0]` to `points[i]`.
    cumulative: Vec<f64>,
}

impl Polyline {
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, pt) in points.iter().enumerate() {
            if i > 0 {
                total += distance(&points[i - 1], pt);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Arc length of the point on the polyline closest to `point`.
    #[must_use]
    pub fn project(&self, point: &Point2) -> f64 {
        let mut best = (f64::INFINITY, 0.0);
        for (i, w) in self.points.windows(2).enumerate() {
            let c = closest_point_on_segment(point, &w[0], &w[1]);
            let d = distance(point, &c);
            if d < best.0 {
                best = (d, self.cumulative[i] + distance(&w[0], &c));
            }
        }
        best.1
    }

    /// Point and travel heading (radians) at arc length `s`, clamped to the polyline.
    #[must_use]
    pub fn sample(&self, s: f64) -> (Point2, f64) {
        match self.points.as_slice() {
            [] => (Point2::origin(), 0.0),
            [only] => (*only, 0.0),
            points => {
                let s = s.clamp(0.0, self.length());
                let i = self
                    .cumulative
                    .partition_point(|&c| c <= s)
                    .clamp(1, points.len() - 1);
                let (a, b) = (points[i - 1], points[i]);
                let span = self.cumulative[i] - self.cumulative[i - 1];
                let t = if span < TOLERANCE {
                    0.0
                } else {
                    (s - self.cumulative[i - 1]) / span
                };
                (a + (b - a) * t, heading_of(&(b - a)))
            }
        }
    }
}

/// Moves a unit along a path, applying the path's end behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFollower {
    path: PathId,
    track: Polyline,
    end_behavior: EndBehavior,
    distance: f64,
    forwards: bool,
    finished: bool,
}

impl PathFollower {
    /// Starts following `path` from the point closest to `start`.
    #[must_use]
    pub fn new(id: PathId, path: &Path, samples: usize, start: &Point2) -> Self {
        let track = Polyline::new(path.polyline(samples));
        let distance = track.project(start);
        Self {
            path: id,
            track,
            end_behavior: path.end_behavior,
            distance,
            forwards: path.direction == Direction::Forwards,
            finished: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> PathId {
        self.path
    }

    /// Arc length travelled from the path start.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[must_use]
    pub fn is_forwards(&self) -> bool {
        self.forwards
    }

    /// Whether a [`EndBehavior::Stop`] path has been run to its end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn position(&self) -> Point2 {
        self.track.sample(self.distance).0
    }

    /// Current travel heading, accounting for direction of travel.
    #[must_use]
    pub fn heading(&self) -> f64 {
        let h = self.track.sample(self.distance).1;
        if self.forwards {
            h
        } else {
            h + std::f64::consts::PI
        }
    }

    /// Moves `step` units along the track.
    pub fn advance(&mut self, step: f64) {
        let len = self.track.length();
        if self.finished || len < TOLERANCE || step <= 0.0 {
            return;
        }

        let mut remaining = match self.end_behavior {
            EndBehavior::Loop => step % len,
            EndBehavior::Reverse => step % (2.0 * len),
            EndBehavior::Stop => step,
        };

        while remaining > 0.0 {
            let room = if self.forwards {
                len - self.distance
            } else {
                self.distance
            };
            if remaining < room {
                self.distance += if self.forwards { remaining } else { -remaining };
                break;
            }

            remaining -= room;
            self.distance = if self.forwards { len } else { 0.0 };
            match self.end_behavior {
                EndBehavior::Loop => self.distance = if self.forwards { 0.0 } else { len },
                EndBehavior::Reverse => self.forwards = !self.forwards,
                EndBehavior::Stop => {
                    self.finished = true;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;
    use approx::assert_abs_diff_eq;
    use slotmap::SlotMap;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn straight(end_behavior: EndBehavior, direction: Direction) -> (PathId, Path) {
        let mut ids: SlotMap<PathId, ()> = SlotMap::with_key();
        let mut path = Path::new("test");
        path.push_segment(PathSegment::line(p(0.0, 0.0), p(10.0, 0.0)));
        path.push_segment(PathSegment::line(p(10.0, 0.0), p(10.0, 10.0)));
        path.end_behavior = end_behavior;
        path.direction = direction;
        (ids.insert(()), path)
    }

    #[test]
    fn polyline_sample_walks_corners() {
        let line = Polyline::new(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)]);
        assert_abs_diff_eq!(line.length(), 20.0);
        assert_abs_diff_eq!(line.sample(15.0).0, p(10.0, 5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(line.sample(99.0).0, p(10.0, 10.0), epsilon = 1e-12);
        assert_abs_diff_eq!(line.project(&p(12.0, 4.0)), 14.0, epsilon = 1e-12);
    }

    #[test]
    fn starts_at_projection_of_spawn_point() {
        let (id, path) = straight(EndBehavior::Stop, Direction::Forwards);
        let f = PathFollower::new(id, &path, 8, &p(4.0, -3.0));
        assert_abs_diff_eq!(f.distance(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.position(), p(4.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn stop_halts_at_end() {
        let (id, path) = straight(EndBehavior::Stop, Direction::Forwards);
        let mut f = PathFollower::new(id, &path, 8, &p(0.0, 0.0));
        f.advance(25.0);
        assert!(f.is_finished());
        assert_abs_diff_eq!(f.position(), p(10.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn loop_wraps_to_start() {
        let (id, path) = straight(EndBehavior::Loop, Direction::Forwards);
        let mut f = PathFollower::new(id, &path, 8, &p(0.0, 0.0));
        f.advance(25.0);
        assert!(!f.is_finished());
        assert_abs_diff_eq!(f.distance(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn reverse_bounces_back() {
        let (id, path) = straight(EndBehavior::Reverse, Direction::Forwards);
        let mut f = PathFollower::new(id, &path, 8, &p(0.0, 0.0));
        f.advance(25.0);
        assert!(!f.is_forwards());
        assert_abs_diff_eq!(f.distance(), 15.0, epsilon = 1e-12);
    }

    #[test]
    fn backwards_path_travels_towards_start() {
        let (id, path) = straight(EndBehavior::Stop, Direction::Backwards);
        let mut f = PathFollower::new(id, &path, 8, &p(10.0, 10.0));
        f.advance(5.0);
        assert_abs_diff_eq!(f.position(), p(10.0, 5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(f.heading(), 1.5 * std::f64::consts::PI, epsilon = 1e-12);
    }
}
