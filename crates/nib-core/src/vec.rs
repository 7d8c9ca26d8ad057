//! 2D/3D vector primitives.
//!
//! `Vec2` is the workhorse for canvas geometry. `Vec3` exists for the
//! homogeneous form used by `Mat33` (points transform with z = 1,
//! directions with z = 0).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or direction in the canvas plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UNIT_X: Vec2 = Vec2 { x: 1.0, y: 0.0 };
    pub const UNIT_Y: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// L2 norm.
    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Angle in radians, measured counterclockwise from +x.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product of the two vectors lifted to z = 0.
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - other.x * self.y
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let mag = self.magnitude();
        if mag <= f64::EPSILON || !mag.is_finite() {
            None
        } else {
            Some(Vec2::new(self.x / mag, self.y / mag))
        }
    }

    /// Rotated 90° counterclockwise. Unit-length input gives the left normal.
    pub fn orthogonal(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// `self + direction.normalized() * distance`. Returns `self` unchanged
    /// when the direction is degenerate.
    pub fn extended(self, distance: f64, direction: Vec2) -> Vec2 {
        match direction.normalized() {
            Some(dir) => self + dir * distance,
            None => self,
        }
    }

    /// A point `fraction` of the way from `self` to `target`.
    pub fn lerp(self, target: Vec2, fraction: f64) -> Vec2 {
        self * (1.0 - fraction) + target * fraction
    }

    /// Combine corresponding components of two vectors.
    pub fn zip(self, other: Vec2, mut f: impl FnMut(f64, f64) -> f64) -> Vec2 {
        Vec2::new(f(self.x, other.x), f(self.y, other.y))
    }

    /// Map each component.
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Vec2 {
        Vec2::new(f(self.x), f(self.y))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise equality within `fuzz`.
    pub fn eq_approx(self, other: Vec2, fuzz: f64) -> bool {
        (self.x - other.x).abs() <= fuzz && (self.y - other.y).abs() <= fuzz
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, c: f64) -> Vec2 {
        Vec2::new(self.x * c, self.y * c)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// A three-component vector. Used as the row type of `Mat33` and as the
/// homogeneous form of `Vec2`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UNIT_X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const UNIT_Y: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const UNIT_Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component by index; panics out of range (indices are always literal).
    pub fn at(self, idx: usize) -> f64 {
        match idx {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => unreachable!("Vec3 component index out of range"),
        }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - other.y * self.z,
            other.x * self.z - self.x * other.z,
            self.x * other.y - other.x * self.y,
        )
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, c: f64) -> Vec3 {
        Vec3::new(self.x * c, self.y * c, self.z * c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_rejects_zero() {
        assert_eq!(Vec2::ZERO.normalized(), None);
        let n = Vec2::new(3.0, 4.0).normalized().unwrap();
        assert!((n.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(5.0, -2.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn cross_sign_matches_orientation() {
        // +x to +y is a counterclockwise turn
        assert!(Vec2::UNIT_X.cross(Vec2::UNIT_Y) > 0.0);
        assert!(Vec2::UNIT_Y.cross(Vec2::UNIT_X) < 0.0);
    }

    #[test]
    fn orthogonal_is_perpendicular() {
        let v = Vec2::new(2.5, -1.0);
        assert_eq!(v.dot(v.orthogonal()), 0.0);
    }

    #[test]
    fn extended_degenerate_direction_is_identity() {
        let p = Vec2::new(1.0, 1.0);
        assert_eq!(p.extended(10.0, Vec2::ZERO), p);
    }
}
