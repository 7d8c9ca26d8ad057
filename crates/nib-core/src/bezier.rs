//! Quadratic and cubic Bézier curves.
//!
//! Everything here is closed-form: bounding boxes come from derivative
//! extrema, line intersections from the quadratic formula / Cardano, and
//! point projection from the roots of the distance derivative.

use crate::line::LineSegment;
use crate::rect::Rect;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Roots with absolute value this close to the [0, 1] boundary still count.
const PARAM_FUZZ: f64 = 1e-9;

/// Real roots of `a·x² + b·x + c = 0`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> SmallVec<[f64; 2]> {
    let mut roots = SmallVec::new();
    if a.abs() <= f64::EPSILON {
        if b.abs() > f64::EPSILON {
            roots.push(-c / b);
        }
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    // Citardauq form on one branch avoids cancellation.
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q.abs() > f64::EPSILON {
        roots.push(q / a);
        roots.push(c / q);
    } else {
        roots.push(0.0);
    }
    roots
}

/// Real roots of `a·x³ + b·x² + c·x + d = 0` (Cardano; trigonometric form
/// for the three-real-root case).
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> SmallVec<[f64; 3]> {
    if a.abs() <= f64::EPSILON {
        return solve_quadratic(b, c, d).into_iter().collect();
    }

    // Depressed form: t = x + b/(3a), x³ + px + q = 0.
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let mut roots: SmallVec<[f64; 3]> = SmallVec::new();
    let disc = q * q / 4.0 + p * p * p / 27.0;
    if disc > f64::EPSILON {
        let sq = disc.sqrt();
        roots.push((-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt() + shift);
    } else if disc >= -f64::EPSILON {
        // Double root case.
        let u = (-q / 2.0).cbrt();
        roots.push(2.0 * u + shift);
        roots.push(-u + shift);
    } else {
        let r = (-p * p * p / 27.0).sqrt();
        let phi = (-q / (2.0 * r)).clamp(-1.0, 1.0).acos();
        let m = 2.0 * (-p / 3.0).sqrt();
        for k in 0..3 {
            roots.push(m * ((phi + 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() + shift);
        }
    }
    roots
}

fn keep_unit_interval(ts: impl IntoIterator<Item = f64>) -> SmallVec<[f64; 3]> {
    ts.into_iter()
        .filter(|t| (-PARAM_FUZZ..=1.0 + PARAM_FUZZ).contains(t))
        .map(|t| t.clamp(0.0, 1.0))
        .collect()
}

/// Shared intersection filter: keep curve parameters whose evaluated point
/// actually lies within the query segment's span.
fn filter_on_segment(
    ts: SmallVec<[f64; 3]>,
    at: impl Fn(f64) -> Vec2,
    seg: &LineSegment,
) -> SmallVec<[f64; 3]> {
    ts.into_iter()
        .filter(|&t| {
            let p = at(t);
            let s = seg.project(p);
            (-PARAM_FUZZ..=1.0 + PARAM_FUZZ).contains(&s)
        })
        .collect()
}

// ─── Quadratic ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
}

impl QuadBezier {
    pub const fn new(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self { p0, p1, p2 }
    }

    /// Polynomial coefficients: `B(t) = c0 + c1·t + c2·t²`.
    fn coefficients(&self) -> (Vec2, Vec2, Vec2) {
        (
            self.p0,
            (self.p1 - self.p0) * 2.0,
            self.p0 - self.p1 * 2.0 + self.p2,
        )
    }

    pub fn at(&self, t: f64) -> Vec2 {
        let (c0, c1, c2) = self.coefficients();
        c0 + c1 * t + c2 * (t * t)
    }

    pub fn derivative_at(&self, t: f64) -> Vec2 {
        let (_, c1, c2) = self.coefficients();
        c1 + c2 * (2.0 * t)
    }

    /// Unit normal at `t` (left of travel), or `None` at a cusp.
    pub fn normal_at(&self, t: f64) -> Option<Vec2> {
        self.derivative_at(t).normalized().map(Vec2::orthogonal)
    }

    /// Exact bounding box from derivative extrema.
    pub fn bbox(&self) -> Rect {
        let (_, c1, c2) = self.coefficients();
        let mut points: SmallVec<[Vec2; 4]> = SmallVec::new();
        points.push(self.p0);
        points.push(self.p2);
        for (c1_axis, c2_axis) in [(c1.x, c2.x), (c1.y, c2.y)] {
            if c2_axis.abs() > f64::EPSILON {
                let t = -c1_axis / (2.0 * c2_axis);
                if (0.0..=1.0).contains(&t) {
                    points.push(self.at(t));
                }
            }
        }
        Rect::bbox_of(points, 0.0)
    }

    /// Curve parameters where the curve crosses the segment's carrying
    /// line, filtered to points within the segment's span.
    pub fn intersect_line(&self, seg: &LineSegment) -> SmallVec<[f64; 3]> {
        let Some(normal) = seg.direction().normalized().map(Vec2::orthogonal) else {
            return SmallVec::new();
        };
        let offset = normal.dot(seg.start);
        let (c0, c1, c2) = self.coefficients();
        let ts = keep_unit_interval(solve_quadratic(
            normal.dot(c2),
            normal.dot(c1),
            normal.dot(c0) - offset,
        ));
        filter_on_segment(ts, |t| self.at(t), seg)
    }

    /// Parameter of the closest point on the curve to `p`.
    pub fn project(&self, p: Vec2) -> f64 {
        let (c0, c1, c2) = self.coefficients();
        let d0 = c0 - p;
        // d/dt |B(t) - p|² is a cubic.
        let roots = solve_cubic(
            2.0 * c2.dot(c2),
            3.0 * c1.dot(c2),
            c1.dot(c1) + 2.0 * d0.dot(c2),
            d0.dot(c1),
        );
        let mut best_t = 0.0;
        let mut best_d = (self.at(0.0) - p).magnitude();
        for t in keep_unit_interval(roots).into_iter().chain([1.0]) {
            let d = (self.at(t) - p).magnitude();
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }
        best_t
    }

    /// Distance from `p` to the nearest point on the curve.
    pub fn distance_to(&self, p: Vec2) -> f64 {
        (self.at(self.project(p)) - p).magnitude()
    }
}

// ─── Cubic ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub const fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Polynomial coefficients: `B(t) = c0 + c1·t + c2·t² + c3·t³`.
    fn coefficients(&self) -> (Vec2, Vec2, Vec2, Vec2) {
        (
            self.p0,
            (self.p1 - self.p0) * 3.0,
            (self.p0 - self.p1 * 2.0 + self.p2) * 3.0,
            (self.p1 - self.p2) * 3.0 + self.p3 - self.p0,
        )
    }

    pub fn at(&self, t: f64) -> Vec2 {
        let (c0, c1, c2, c3) = self.coefficients();
        c0 + c1 * t + c2 * (t * t) + c3 * (t * t * t)
    }

    pub fn derivative_at(&self, t: f64) -> Vec2 {
        let (_, c1, c2, c3) = self.coefficients();
        c1 + c2 * (2.0 * t) + c3 * (3.0 * t * t)
    }

    pub fn bbox(&self) -> Rect {
        let (_, c1, c2, c3) = self.coefficients();
        let mut points: SmallVec<[Vec2; 6]> = SmallVec::new();
        points.push(self.p0);
        points.push(self.p3);
        for (c1a, c2a, c3a) in [(c1.x, c2.x, c3.x), (c1.y, c2.y, c3.y)] {
            for t in solve_quadratic(3.0 * c3a, 2.0 * c2a, c1a) {
                if (0.0..=1.0).contains(&t) {
                    points.push(self.at(t));
                }
            }
        }
        Rect::bbox_of(points, 0.0)
    }

    pub fn intersect_line(&self, seg: &LineSegment) -> SmallVec<[f64; 3]> {
        let Some(normal) = seg.direction().normalized().map(Vec2::orthogonal) else {
            return SmallVec::new();
        };
        let offset = normal.dot(seg.start);
        let (c0, c1, c2, c3) = self.coefficients();
        let ts = keep_unit_interval(solve_cubic(
            normal.dot(c3),
            normal.dot(c2),
            normal.dot(c1),
            normal.dot(c0) - offset,
        ));
        filter_on_segment(ts, |t| self.at(t), seg)
    }
}
