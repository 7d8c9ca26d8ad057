//! 3×3 matrices.
//!
//! A `Mat33` doubles as a linear transform of ℝ³ and an affine transform of
//! the canvas plane: points are lifted to z = 1 so the last column carries
//! translation, directions use z = 0 and ignore it.
//!
//! Inversion is explicit about failure: `invertible()` / `inverse_checked()`
//! report near-singular matrices (pivot below `PIVOT_EPSILON`), and
//! `inverse_or_identity()` is the documented fallback for call sites that
//! accept an identity degrade instead of an error.

use crate::vec::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Pivots smaller than this are treated as zero during elimination.
const PIVOT_EPSILON: f64 = 1e-12;

/// Row-major 3×3 matrix. `a*` is the first row, `c*` the last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat33 {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
}

impl Mat33 {
    pub const IDENTITY: Mat33 = Mat33::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);

    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        a1: f64,
        a2: f64,
        a3: f64,
        b1: f64,
        b2: f64,
        b3: f64,
        c1: f64,
        c2: f64,
        c3: f64,
    ) -> Self {
        Self { a1, a2, a3, b1, b2, b3, c1, c2, c3 }
    }

    pub fn of_rows(r1: Vec3, r2: Vec3, r3: Vec3) -> Self {
        Self::new(r1.x, r1.y, r1.z, r2.x, r2.y, r2.z, r3.x, r3.y, r3.z)
    }

    pub fn rows(&self) -> [Vec3; 3] {
        [
            Vec3::new(self.a1, self.a2, self.a3),
            Vec3::new(self.b1, self.b2, self.b3),
            Vec3::new(self.c1, self.c2, self.c3),
        ]
    }

    pub fn transposed(&self) -> Mat33 {
        Mat33::new(
            self.a1, self.b1, self.c1, self.a2, self.b2, self.c2, self.a3, self.b3, self.c3,
        )
    }

    /// Right multiplication of a column vector.
    pub fn transform_vec3(&self, v: Vec3) -> Vec3 {
        let [r1, r2, r3] = self.rows();
        Vec3::new(r1.dot(v), r2.dot(v), r3.dot(v))
    }

    /// Affine transform of a point (homogeneous z = 1).
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.transform_vec3(Vec3::new(p.x, p.y, 1.0)).xy()
    }

    /// Linear transform of a direction (z = 0, translation ignored).
    pub fn transform_vec(&self, v: Vec2) -> Vec2 {
        self.transform_vec3(Vec3::new(v.x, v.y, 0.0)).xy()
    }

    pub fn determinant(&self) -> f64 {
        self.a1 * (self.b2 * self.c3 - self.b3 * self.c2)
            - self.a2 * (self.b1 * self.c3 - self.b3 * self.c1)
            + self.a3 * (self.b1 * self.c2 - self.b2 * self.c1)
    }

    /// Whether Gauss–Jordan elimination finds a usable pivot in every column.
    pub fn invertible(&self) -> bool {
        self.inverse_checked().is_some()
    }

    /// The inverse, or `None` when the matrix is singular to working
    /// precision. Gauss–Jordan with partial pivoting.
    pub fn inverse_checked(&self) -> Option<Mat33> {
        let mut lhs = self.rows();
        let mut rhs = [Vec3::UNIT_X, Vec3::UNIT_Y, Vec3::UNIT_Z];

        for col in 0..3 {
            // Pick the remaining row with the largest entry in this column.
            let pivot_row = (col..3)
                .max_by(|&a, &b| {
                    lhs[a]
                        .at(col)
                        .abs()
                        .partial_cmp(&lhs[b].at(col).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(col);
            let pivot = lhs[pivot_row].at(col);
            if pivot.abs() < PIVOT_EPSILON || !pivot.is_finite() {
                return None;
            }
            lhs.swap(col, pivot_row);
            rhs.swap(col, pivot_row);

            let scale = 1.0 / pivot;
            lhs[col] = lhs[col] * scale;
            rhs[col] = rhs[col] * scale;

            for row in 0..3 {
                if row == col {
                    continue;
                }
                let factor = -lhs[row].at(col);
                lhs[row] = lhs[row] + lhs[col] * factor;
                rhs[row] = rhs[row] + rhs[col] * factor;
            }
        }

        Some(Mat33::of_rows(rhs[0], rhs[1], rhs[2]))
    }

    /// The inverse, degrading to the identity for singular matrices. Only
    /// call where an identity fallback is an acceptable contract; elsewhere
    /// use `inverse_checked` and treat `None` as an error.
    pub fn inverse_or_identity(&self) -> Mat33 {
        self.inverse_checked().unwrap_or_else(|| {
            log::warn!("inverting a singular matrix; falling back to identity");
            Mat33::IDENTITY
        })
    }

    /// Equality within `fuzz`, component-wise.
    pub fn eq_approx(&self, other: &Mat33, fuzz: f64) -> bool {
        self.rows()
            .iter()
            .zip(other.rows().iter())
            .all(|(a, b)| {
                (a.x - b.x).abs() <= fuzz && (a.y - b.y).abs() <= fuzz && (a.z - b.z).abs() <= fuzz
            })
    }

    /// A transform translating points by `amount`.
    pub fn translation(amount: Vec2) -> Mat33 {
        Mat33::new(1.0, 0.0, amount.x, 0.0, 1.0, amount.y, 0.0, 0.0, 1.0)
    }

    /// Rotation by `radians` counterclockwise about `center`.
    pub fn rotation(radians: f64, center: Vec2) -> Mat33 {
        let (sin, cos) = radians.sin_cos();
        let rotate = Mat33::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0);
        Mat33::translation(center) * rotate * Mat33::translation(-center)
    }

    /// Uniform scale by `amount` about `center`.
    pub fn scaling(amount: f64, center: Vec2) -> Mat33 {
        let scale = Mat33::new(amount, 0.0, 0.0, 0.0, amount, 0.0, 0.0, 0.0, 1.0);
        Mat33::translation(center) * scale * Mat33::translation(-center)
    }
}

impl Mul for Mat33 {
    type Output = Mat33;

    /// `self * rhs`: applies `rhs` first, then `self`.
    fn mul(self, rhs: Mat33) -> Mat33 {
        let cols = rhs.transposed().rows();
        let rows = self.rows();
        let at = |r: usize, c: usize| rows[r].dot(cols[c]);
        Mat33::new(
            at(0, 0),
            at(0, 1),
            at(0, 2),
            at(1, 0),
            at(1, 1),
            at(1, 2),
            at(2, 0),
            at(2, 1),
            at(2, 2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transforms_are_noops() {
        let p = Vec2::new(3.0, -7.5);
        assert_eq!(Mat33::IDENTITY.transform_point(p), p);
        assert_eq!(Mat33::IDENTITY.transform_vec(p), p);
    }

    #[test]
    fn translation_moves_points_not_directions() {
        let t = Mat33::translation(Vec2::new(10.0, -4.0));
        assert_eq!(t.transform_point(Vec2::ZERO), Vec2::new(10.0, -4.0));
        assert_eq!(t.transform_vec(Vec2::UNIT_X), Vec2::UNIT_X);
    }

    #[test]
    fn rotation_about_center_fixes_center() {
        let center = Vec2::new(5.0, 5.0);
        let r = Mat33::rotation(std::f64::consts::FRAC_PI_2, center);
        assert!(r.transform_point(center).eq_approx(center, 1e-12));

        let moved = r.transform_point(Vec2::new(6.0, 5.0));
        assert!(moved.eq_approx(Vec2::new(5.0, 6.0), 1e-12));
    }

    #[test]
    fn inverse_roundtrip() {
        let m = Mat33::translation(Vec2::new(2.0, 3.0))
            * Mat33::rotation(0.7, Vec2::new(1.0, 1.0))
            * Mat33::scaling(2.5, Vec2::ZERO);
        let inv = m.inverse_checked().expect("should invert");
        assert!((m * inv).eq_approx(&Mat33::IDENTITY, 1e-9));
        assert!((inv * m).eq_approx(&Mat33::IDENTITY, 1e-9));
    }

    #[test]
    fn singular_matrix_is_detected() {
        let squash = Mat33::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        assert!(!squash.invertible());
        assert_eq!(squash.inverse_checked(), None);
        assert_eq!(squash.inverse_or_identity(), Mat33::IDENTITY);
    }

    #[test]
    fn multiplication_composes_right_to_left() {
        let scale = Mat33::scaling(2.0, Vec2::ZERO);
        let shift = Mat33::translation(Vec2::new(1.0, 0.0));
        // shift ∘ scale: scale first, then shift
        let m = shift * scale;
        assert_eq!(m.transform_point(Vec2::new(1.0, 0.0)), Vec2::new(3.0, 0.0));
    }
}
