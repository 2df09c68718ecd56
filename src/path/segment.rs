use serde::{Deserialize, Serialize};

use crate::math::{
    closest_point_on_segment, cubic_bezier_point, distance, indicator_heading, Point2, Vector2,
};
use crate::trigger::{TriggerNode, VisualHandle};

/// Geometry of a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentShape {
    Line {
        start: Point2,
        end: Point2,
    },
    Bezier {
        start: Point2,
        control1: Point2,
        control2: Point2,
        end: Point2,
    },
}

/// One span of a path, owning the trigger nodes attached to it.
///
/// Proximity queries on Bézier segments use the start–end chord; the bend of
/// the curve only shows up in [`polyline`](Self::polyline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub shape: SegmentShape,
    #[serde(default)]
    nodes: Vec<TriggerNode>,
    #[serde(skip)]
    pub visual: Option<VisualHandle>,
}

impl PathSegment {
    #[must_use]
    pub fn new(shape: SegmentShape) -> Self {
        Self {
            shape,
            nodes: Vec::new(),
            visual: None,
        }
    }

    #[must_use]
    pub fn line(start: Point2, end: Point2) -> Self {
        Self::new(SegmentShape::Line { start, end })
    }

    #[must_use]
    pub fn bezier(start: Point2, control1: Point2, control2: Point2, end: Point2) -> Self {
        Self::new(SegmentShape::Bezier {
            start,
            control1,
            control2,
            end,
        })
    }

    #[must_use]
    pub fn start_point(&self) -> Point2 {
        match self.shape {
            SegmentShape::Line { start, .. } | SegmentShape::Bezier { start, .. } => start,
        }
    }

    #[must_use]
    pub fn end_point(&self) -> Point2 {
        match self.shape {
            SegmentShape::Line { end, .. } | SegmentShape::Bezier { end, .. } => end,
        }
    }

    /// Midpoint of the chord and the heading of the direction indicator drawn there.
    #[must_use]
    pub fn midpoint_and_heading(&self) -> (Point2, f64) {
        let start = self.start_point();
        let end = self.end_point();
        (nalgebra::center(&start, &end), indicator_heading(&start, &end))
    }

    /// Closest point on the start–end chord to `point`.
    #[must_use]
    pub fn closest_point(&self, point: &Point2) -> Point2 {
        closest_point_on_segment(point, &self.start_point(), &self.end_point())
    }

    #[must_use]
    pub fn distance_to(&self, point: &Point2) -> f64 {
        distance(point, &self.closest_point(point))
    }

    /// Moves the segment and every attached node by `offset`.
    pub fn translate(&mut self, offset: &Vector2) {
        match &mut self.shape {
            SegmentShape::Line { start, end } => {
                *start += *offset;
                *end += *offset;
            }
            SegmentShape::Bezier {
                start,
                control1,
                control2,
                end,
            } => {
                *start += *offset;
                *control1 += *offset;
                *control2 += *offset;
                *end += *offset;
            }
        }
        for node in &mut self.nodes {
            node.translate(offset);
        }
    }

    /// Points along the segment for drawing and path following.
    ///
    /// Lines yield their two endpoints; Bézier curves are sampled `samples` times.
    #[must_use]
    pub fn polyline(&self, samples: usize) -> Vec<Point2> {
        match &self.shape {
            SegmentShape::Line { start, end } => vec![*start, *end],
            SegmentShape::Bezier {
                start,
                control1,
                control2,
                end,
            } => {
                let n = samples.max(1);
                (0..=n)
                    .map(|i| {
                        #[allow(clippy::cast_precision_loss)]
                        let t = i as f64 / n as f64;
                        cubic_bezier_point(start, control1, control2, end, t)
                    })
                    .collect()
            }
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[TriggerNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [TriggerNode] {
        &mut self.nodes
    }

    /// Appends a node and returns its index within this segment.
    pub fn attach_node(&mut self, node: TriggerNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn remove_node(&mut self, index: usize) -> Option<TriggerNode> {
        (index < self.nodes.len()).then(|| self.nodes.remove(index))
    }
}
