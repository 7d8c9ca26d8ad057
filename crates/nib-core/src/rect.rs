//! Axis-aligned rectangles.
//!
//! Negative extents are normalized at construction, so `w >= 0 && h >= 0`
//! always holds. Derived geometry (corners, center, area) is computed from
//! the canonical fields rather than stored.

use crate::mat::Mat33;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const EMPTY: Rect = Rect { x: 0.0, y: 0.0, w: 0.0, h: 0.0 };
    pub const UNIT: Rect = Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 };

    /// Normalizing constructor: negative width/height flip the origin.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        Self { x, y, w, h }
    }

    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Smallest rectangle containing every point, with `margin` of slack on
    /// each side. An empty iterator yields `Rect::EMPTY`.
    pub fn bbox_of(points: impl IntoIterator<Item = Vec2>, margin: f64) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Rect::EMPTY;
        };
        let (mut min, mut max) = (first, first);
        for p in iter {
            min = min.zip(p, f64::min);
            max = max.zip(p, f64::max);
        }
        Self::from_corners(
            min - Vec2::new(margin, margin),
            max + Vec2::new(margin, margin),
        )
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn bottom_right(&self) -> Vec2 {
        self.top_left() + self.size()
    }

    pub fn center(&self) -> Vec2 {
        self.top_left() + self.size() * 0.5
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn max_dimension(&self) -> f64 {
        self.w.max(self.h)
    }

    pub fn translated_by(&self, v: Vec2) -> Rect {
        Rect { x: self.x + v.x, y: self.y + v.y, ..*self }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.x <= p.x && self.y <= p.y && p.x <= self.x + self.w && p.y <= self.y + self.h
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.bottom_right().x <= self.bottom_right().x
            && other.bottom_right().y <= self.bottom_right().y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// The overlap of two rectangles, or `None` when they are disjoint.
    /// Touching edges count as intersecting (zero-area overlap).
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let top_left = self.top_left().zip(other.top_left(), f64::max);
        let bottom_right = self.bottom_right().zip(other.bottom_right(), f64::min);
        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return None;
        }
        Some(Rect::from_corners(top_left, bottom_right))
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.top_left().zip(other.top_left(), f64::min),
            self.bottom_right().zip(other.bottom_right(), f64::max),
        )
    }

    /// Grown so that `point` is at least `margin` away from every edge.
    pub fn grown_to_point(&self, point: Vec2, margin: f64) -> Rect {
        self.union(&Rect::new(
            point.x - margin,
            point.y - margin,
            margin * 2.0,
            margin * 2.0,
        ))
    }

    /// Expanded by `margin` on every side.
    pub fn grown(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.top_left(),
            self.top_left() + Vec2::new(self.w, 0.0),
            self.bottom_right(),
            self.top_left() + Vec2::new(0.0, self.h),
        ]
    }

    /// Edges in corner order, each as a (start, end) pair.
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let c = self.corners();
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }

    /// Bounding box of the four corners after an affine transform.
    pub fn transformed_bbox(&self, transform: &Mat33) -> Rect {
        Rect::bbox_of(self.corners().map(|c| transform.transform_point(c)), 0.0)
    }

    pub fn eq_approx(&self, other: &Rect, fuzz: f64) -> bool {
        self.top_left().eq_approx(other.top_left(), fuzz)
            && self.size().eq_approx(other.size(), fuzz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn negative_extents_normalize() {
        let r = Rect::new(10.0, 10.0, -4.0, -2.0);
        assert_eq!(r, Rect::new(6.0, 8.0, 4.0, 2.0));
    }

    #[test]
    fn union_is_commutative_and_associative() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(5.0, -2.0, 2.0, 3.0);
        let c = Rect::new(-1.0, 4.0, 0.5, 0.5);
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
    }

    #[test]
    fn empty_union_empty_is_empty() {
        assert_eq!(Rect::EMPTY.union(&Rect::EMPTY), Rect::EMPTY);
    }

    #[test]
    fn disjoint_intersection_is_none() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(5.0, 5.0, 1.0, 1.0);
        assert_eq!(a.intersection(&b), None);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn overlap_intersection() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(2.0, 2.0, 2.0, 2.0)));
    }

    #[test]
    fn containment() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inner = Rect::new(2.0, 2.0, 3.0, 3.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.contains_point(Vec2::new(10.0, 10.0)));
        assert!(!outer.contains_point(Vec2::new(10.1, 10.0)));
    }

    #[test]
    fn bbox_of_does_not_assume_origin() {
        // All points far from (0, 0); the box must not include the origin.
        let r = Rect::bbox_of([Vec2::new(5.0, 5.0), Vec2::new(7.0, 6.0)], 0.0);
        assert_eq!(r, Rect::new(5.0, 5.0, 2.0, 1.0));
    }

    #[test]
    fn grown_to_point_keeps_margin() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        let grown = r.grown_to_point(Vec2::new(5.0, 0.5), 2.0);
        assert!(grown.contains_point(Vec2::new(7.0, 0.5)));
        assert!(grown.x <= 0.0);
    }

    #[test]
    fn transformed_bbox_of_rotation() {
        let r = Rect::new(-1.0, -1.0, 2.0, 2.0);
        let rotated = r.transformed_bbox(&Mat33::rotation(std::f64::consts::FRAC_PI_4, Vec2::ZERO));
        let expect = 2.0_f64.sqrt();
        assert!(rotated.eq_approx(&Rect::new(-expect, -expect, expect * 2.0, expect * 2.0), 1e-9));
    }
}
