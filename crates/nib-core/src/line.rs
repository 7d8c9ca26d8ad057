//! Line segments.

use crate::rect::Rect;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};

/// Fuzz applied to the parametric range check so intersections at segment
/// endpoints are not lost to rounding.
const PARAM_FUZZ: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

/// An intersection between two segments: the point and the parametric
/// position on each segment (`0.0` = start, `1.0` = end).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection {
    pub point: Vec2,
    pub t_this: f64,
    pub t_other: f64,
}

impl LineSegment {
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().magnitude()
    }

    pub fn at(&self, t: f64) -> Vec2 {
        self.start + self.direction() * t
    }

    pub fn bbox(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }

    /// Parametric position of `p` projected onto the carrying line.
    pub fn project(&self, p: Vec2) -> f64 {
        let d = self.direction();
        let len_sq = d.dot(d);
        if len_sq <= f64::EPSILON {
            return 0.0;
        }
        (p - self.start).dot(d) / len_sq
    }

    /// Distance from `p` to the nearest point on the segment.
    pub fn distance_to(&self, p: Vec2) -> f64 {
        let t = self.project(p).clamp(0.0, 1.0);
        (self.at(t) - p).magnitude()
    }

    /// Closed-form segment/segment intersection.
    ///
    /// Solves `a.start + t·a.dir = b.start + u·b.dir`. Returns `None` when
    /// the segments are parallel (including collinear) or when the
    /// intersection lies outside either segment's extent.
    pub fn intersection(&self, other: &LineSegment) -> Option<SegmentIntersection> {
        let r = self.direction();
        let s = other.direction();
        let denom = r.cross(s);
        if denom.abs() <= f64::EPSILON {
            return None;
        }

        let offset = other.start - self.start;
        let t = offset.cross(s) / denom;
        let u = offset.cross(r) / denom;
        if !(-PARAM_FUZZ..=1.0 + PARAM_FUZZ).contains(&t)
            || !(-PARAM_FUZZ..=1.0 + PARAM_FUZZ).contains(&u)
        {
            return None;
        }

        Some(SegmentIntersection {
            point: self.at(t.clamp(0.0, 1.0)),
            t_this: t,
            t_other: u,
        })
    }

    /// Intersection point of the infinite lines through the two segments,
    /// ignoring extents. `None` for parallel lines.
    pub fn line_intersection(&self, other: &LineSegment) -> Option<Vec2> {
        let r = self.direction();
        let s = other.direction();
        let denom = r.cross(s);
        if denom.abs() <= f64::EPSILON {
            return None;
        }
        let t = (other.start - self.start).cross(s) / denom;
        Some(self.at(t))
    }
}
