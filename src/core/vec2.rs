//! Fixed-Point 2D Vector
//!
//! Deterministic 2D vector operations for platformer physics.
//! All operations use fixed-point arithmetic.
//!
//! Pixel-scale distances overflow a Q16.16 square (anything past ~181 px),
//! so proximity checks go through the `*_wide` helpers which square in i64.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

use super::fixed::{
    Fixed, FIXED_ONE, FIXED_SCALE,
    fixed_mul, fixed_div, fixed_sqrt, fixed_abs, fixed_max,
};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point, grows downward)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
        }
    }

    /// Divide by a fixed-point scalar.
    #[inline]
    pub fn div_scalar(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_div(self.x, scalar),
            y: fixed_div(self.y, scalar),
        }
    }

    /// Squared length (avoids sqrt). Only safe for short vectors.
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x)
            .wrapping_add(fixed_mul(self.y, self.y))
    }

    /// Length (magnitude). Only safe for short vectors.
    #[inline]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Squared distance to another point, in i64 Q32.32.
    ///
    /// Never overflows for any pair of positions.
    #[inline]
    pub fn distance_squared_wide(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// True when `other` is within `radius` (inclusive) of this point.
    #[inline]
    pub fn within_radius(self, other: Self, radius: Fixed) -> bool {
        let r = radius as i64;
        self.distance_squared_wide(other) <= r * r
    }

    /// Normalize to unit length.
    /// Returns ZERO if length is zero.
    ///
    /// The vector is first divided by its largest component so that the
    /// squared length stays inside Q16.16 for any pixel-scale input.
    #[inline]
    pub fn normalize(self) -> Self {
        let largest = fixed_max(fixed_abs(self.x), fixed_abs(self.y));
        if largest == 0 {
            return Self::ZERO;
        }
        let reduced = self.div_scalar(largest);
        let len = reduced.length();
        if len == 0 {
            return Self::ZERO;
        }
        reduced.div_scalar(len)
    }

    /// Negate both components.
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
        }
    }

    /// Convert to float tuple for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (
            self.x as f32 / FIXED_ONE as f32,
            self.y as f32 / FIXED_ONE as f32,
        )
    }
}

// Operator overloads for ergonomics
impl Add for FixedVec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FixedVec2::add(self, rhs)
    }
}

impl Sub for FixedVec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        FixedVec2::sub(self, rhs)
    }
}

impl Neg for FixedVec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fy)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.3}, {:.3})", fx, fy)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_vec2_arithmetic() {
        let a = FixedVec2::from_ints(3, 4);
        let b = FixedVec2::from_ints(1, 2);
        assert_eq!(a + b, FixedVec2::from_ints(4, 6));
        assert_eq!(a - b, FixedVec2::from_ints(2, 2));
        assert_eq!(a.scale(to_fixed(2.0)), FixedVec2::from_ints(6, 8));
        assert_eq!(-a, FixedVec2::from_ints(-3, -4));
    }

    #[test]
    fn test_within_radius_far_apart() {
        // 3000 px apart would overflow a Q16.16 square
        let a = FixedVec2::from_ints(100, 300);
        let b = FixedVec2::from_ints(3100, 300);
        assert!(!a.within_radius(b, to_fixed(30.0)));
        assert!(a.within_radius(b, to_fixed(3000.0)));
    }

    #[test]
    fn test_within_radius_boundary() {
        let a = FixedVec2::from_ints(0, 0);
        let b = FixedVec2::from_ints(30, 40);
        assert!(a.within_radius(b, to_fixed(50.0)));
        assert!(!a.within_radius(b, to_fixed(49.0)));
    }

    #[test]
    fn test_normalize_large_vector() {
        let v = FixedVec2::from_ints(300, 400);
        let n = v.normalize();
        assert!((n.x - to_fixed(0.6)).abs() < 200);
        assert!((n.y - to_fixed(0.8)).abs() < 200);
        assert_eq!(FixedVec2::ZERO.normalize(), FixedVec2::ZERO);
    }
}
