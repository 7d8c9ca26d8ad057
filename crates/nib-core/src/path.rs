//! Multi-segment paths.
//!
//! A path is a start point plus an ordered command list. Per-command
//! segment geometry is derived once at construction; the invariant is that
//! `geometry().len()` equals the number of non-`MoveTo` commands, and every
//! command's implicit start is the previous command's end point.

use crate::bezier::{CubicBezier, QuadBezier};
use crate::line::LineSegment;
use crate::mat::Mat33;
use crate::rect::Rect;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};

/// A single path command. Each command's start point is implicit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, end: Vec2 },
    CubicTo { c1: Vec2, c2: Vec2, end: Vec2 },
}

impl PathCmd {
    pub fn end_point(&self) -> Vec2 {
        match *self {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => p,
            PathCmd::QuadTo { end, .. } | PathCmd::CubicTo { end, .. } => end,
        }
    }
}

/// Resolved geometry for one drawable (non-`MoveTo`) command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(LineSegment),
    Quad(QuadBezier),
    Cubic(CubicBezier),
}

impl Segment {
    pub fn bbox(&self) -> Rect {
        match self {
            Segment::Line(l) => l.bbox(),
            Segment::Quad(q) => q.bbox(),
            Segment::Cubic(c) => c.bbox(),
        }
    }

    /// Intersection points with a line segment.
    pub fn intersect_line(&self, seg: &LineSegment) -> Vec<Vec2> {
        match self {
            Segment::Line(l) => l.intersection(seg).map(|i| i.point).into_iter().collect(),
            Segment::Quad(q) => q.intersect_line(seg).iter().map(|&t| q.at(t)).collect(),
            Segment::Cubic(c) => c.intersect_line(seg).iter().map(|&t| c.at(t)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    start: Vec2,
    commands: Vec<PathCmd>,
    geometry: Vec<Segment>,
    bbox: Rect,
}

impl Path {
    pub fn new(start: Vec2, commands: Vec<PathCmd>) -> Self {
        let geometry = Self::build_geometry(start, &commands);
        let bbox = Self::compute_bbox(start, &geometry);
        Self { start, commands, geometry, bbox }
    }

    fn build_geometry(start: Vec2, commands: &[PathCmd]) -> Vec<Segment> {
        let mut cursor = start;
        let mut geometry = Vec::with_capacity(commands.len());
        for cmd in commands {
            match *cmd {
                PathCmd::MoveTo(p) => cursor = p,
                PathCmd::LineTo(p) => {
                    geometry.push(Segment::Line(LineSegment::new(cursor, p)));
                    cursor = p;
                }
                PathCmd::QuadTo { ctrl, end } => {
                    geometry.push(Segment::Quad(QuadBezier::new(cursor, ctrl, end)));
                    cursor = end;
                }
                PathCmd::CubicTo { c1, c2, end } => {
                    geometry.push(Segment::Cubic(CubicBezier::new(cursor, c1, c2, end)));
                    cursor = end;
                }
            }
        }
        geometry
    }

    fn compute_bbox(start: Vec2, geometry: &[Segment]) -> Rect {
        let mut bbox = Rect::new(start.x, start.y, 0.0, 0.0);
        for seg in geometry {
            bbox = bbox.union(&seg.bbox());
        }
        bbox
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn commands(&self) -> &[PathCmd] {
        &self.commands
    }

    pub fn geometry(&self) -> &[Segment] {
        &self.geometry
    }

    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// All points where the path crosses the given segment.
    pub fn intersection_with_line(&self, seg: &LineSegment) -> Vec<Vec2> {
        let mut points = Vec::new();
        if !self.bbox.intersects(&seg.bbox()) {
            return points;
        }
        for segment in &self.geometry {
            points.extend(segment.intersect_line(seg));
        }
        points
    }

    pub fn intersects_line(&self, seg: &LineSegment) -> bool {
        !self.intersection_with_line(seg).is_empty()
    }

    /// A copy with every point mapped through an affine transform.
    pub fn transformed(&self, transform: &Mat33) -> Path {
        let map = |p: Vec2| transform.transform_point(p);
        let commands = self
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(p) => PathCmd::MoveTo(map(p)),
                PathCmd::LineTo(p) => PathCmd::LineTo(map(p)),
                PathCmd::QuadTo { ctrl, end } => PathCmd::QuadTo { ctrl: map(ctrl), end: map(end) },
                PathCmd::CubicTo { c1, c2, end } => {
                    PathCmd::CubicTo { c1: map(c1), c2: map(c2), end: map(end) }
                }
            })
            .collect();
        Path::new(map(self.start), commands)
    }
}
