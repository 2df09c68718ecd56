mod follower;
mod segment;

pub use follower::{PathFollower, Polyline};
pub use segment::{PathSegment, SegmentShape};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DocumentError;
use crate::math::{distance, Point2, Vector2, TOLERANCE};
use crate::trigger::TriggerNode;

/// Direction a follower travels along the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forwards,
    Backwards,
}

/// What a follower does on reaching the end of the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    Loop,
    Reverse,
    #[default]
    Stop,
}

/// A transition of a path's activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationChange {
    Activated,
    Deactivated,
}

/// An ordered chain of segments with an activation window on the stage timeline.
///
/// The path is active while `activation_progress <= progress <= deactivation_progress`.
/// An inverted window (`activation_progress > deactivation_progress`) is left as
/// authored and never activates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    segments: Vec<PathSegment>,
    #[serde(default)]
    pub direction: Direction,
    pub activation_progress: f64,
    pub deactivation_progress: f64,
    #[serde(default)]
    pub end_behavior: EndBehavior,
    #[serde(skip)]
    is_activated: bool,
}

impl Path {
    /// Creates an empty path whose window covers the whole timeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            direction: Direction::default(),
            activation_progress: 0.0,
            deactivation_progress: f64::MAX,
            end_behavior: EndBehavior::default(),
            is_activated: false,
        }
    }

    /// Sets the activation window.
    #[must_use]
    pub fn with_window(mut self, activation: f64, deactivation: f64) -> Self {
        self.activation_progress = activation;
        self.deactivation_progress = deactivation;
        self
    }

    // --- Segments ---

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [PathSegment] {
        &mut self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a segment and returns its index.
    pub fn push_segment(&mut self, segment: PathSegment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    /// Removes a segment together with its nodes.
    pub fn remove_segment(&mut self, index: usize) -> Option<PathSegment> {
        (index < self.segments.len()).then(|| self.segments.remove(index))
    }

    /// All nodes on all segments, in segment then insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TriggerNode> {
        self.segments.iter().flat_map(PathSegment::nodes)
    }

    /// Attaches `node` to the segment closest to its position.
    ///
    /// Returns `(segment, node)` indices, or `None` (dropping the node) if the
    /// path has no segments.
    pub fn attach_node(&mut self, node: TriggerNode) -> Option<(usize, usize)> {
        let seg = self.closest_segment(&node.position())?;
        let idx = self.segments[seg].attach_node(node);
        Some((seg, idx))
    }

    // --- Geometry ---

    /// Index of the segment closest to `point`; ties go to the earliest segment.
    #[must_use]
    pub fn closest_segment(&self, point: &Point2) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, seg) in self.segments.iter().enumerate() {
            let d = seg.distance_to(point);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Closest point to `point` across all segments, `None` for an empty path.
    #[must_use]
    pub fn closest_point(&self, point: &Point2) -> Option<Point2> {
        self.closest_segment(point)
            .map(|i| self.segments[i].closest_point(point))
    }

    /// Distance from `point` to the path, infinite for an empty path.
    #[must_use]
    pub fn distance_to_closest_point(&self, point: &Point2) -> f64 {
        self.closest_point(point)
            .map_or(f64::INFINITY, |c| distance(point, &c))
    }

    /// Moves every segment and node by `offset`.
    pub fn translate(&mut self, offset: &Vector2) {
        for seg in &mut self.segments {
            seg.translate(offset);
        }
    }

    /// The path as one connected polyline, for drawing and hit-testing.
    ///
    /// Joints shared by consecutive segments appear once.
    #[must_use]
    pub fn polyline(&self, bezier_samples: usize) -> Vec<Point2> {
        let mut points: Vec<Point2> = Vec::new();
        for seg in &self.segments {
            let mut pts = seg.polyline(bezier_samples).into_iter();
            if let (Some(last), Some(first)) = (points.last(), pts.as_slice().first()) {
                if distance(last, first) < TOLERANCE {
                    pts.next();
                }
            }
            points.extend(pts);
        }
        points
    }

    /// Arc length of [`polyline`](Self::polyline).
    #[must_use]
    pub fn length(&self, bezier_samples: usize) -> f64 {
        Polyline::new(self.polyline(bezier_samples)).length()
    }

    // --- Activation ---

    /// Whether `progress` lies inside the activation window (both ends inclusive).
    #[must_use]
    pub fn is_active_at(&self, progress: f64) -> bool {
        self.activation_progress <= progress && progress <= self.deactivation_progress
    }

    /// Cached activation state from the last [`update_activation`](Self::update_activation).
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.is_activated
    }

    #[must_use]
    pub fn has_inverted_window(&self) -> bool {
        self.activation_progress > self.deactivation_progress
    }

    /// Applies the activation rule for `progress` and reports any transition.
    ///
    /// Entering the window arms every node. Leaving it keeps node state, so
    /// action nodes remember their consumers across re-entry.
    pub fn update_activation(&mut self, progress: f64) -> Option<ActivationChange> {
        let inside = self.is_active_at(progress);
        match (self.is_activated, inside) {
            (false, true) => {
                self.activate();
                debug!(path = %self.name, progress, "path activated");
                Some(ActivationChange::Activated)
            }
            (true, false) => {
                self.is_activated = false;
                debug!(path = %self.name, progress, "path deactivated");
                Some(ActivationChange::Deactivated)
            }
            _ => None,
        }
    }

    /// Sets the cached activation state for `progress` without touching nodes.
    ///
    /// Used when resuming a saved stage, whose nodes already carry their own
    /// armed state and timers.
    pub fn restore_activation(&mut self, progress: f64) {
        self.is_activated = self.is_active_at(progress);
    }

    /// Marks the path activated and arms every node on every segment.
    pub fn activate(&mut self) {
        self.is_activated = true;
        for seg in &mut self.segments {
            for node in seg.nodes_mut() {
                node.activate();
            }
        }
    }

    /// Explicit stage reset: deactivates the path and resets every node.
    pub fn reset(&mut self) {
        self.is_activated = false;
        for seg in &mut self.segments {
            for node in seg.nodes_mut() {
                node.reset();
            }
        }
    }

    // --- Persistence ---

    /// Encodes the path, its segments and nodes as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a path previously produced by [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a well-formed path.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}
