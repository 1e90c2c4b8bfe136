//! Q16.16 Fixed-Point Arithmetic
//!
//! This module provides deterministic fixed-point math for the platformer
//! simulation. All operations use integer arithmetic only - no floats in
//! gameplay logic.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 px                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Units
//!
//! Positions are screen pixels with y pointing down. Velocities are pixels
//! per nominal 60 Hz frame, so `dt == FIXED_ONE` is exactly one frame.
//! The longest generated level is 11000 px wide, well inside the range.

use std::fmt;
use std::ops::{Add, Sub, Mul, Neg};

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// GAME CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// One nominal frame of simulated time.
pub const FRAME_DT: Fixed = FIXED_ONE;

/// Horizontal run speed: 5.0 px/frame = 5 * 65536
pub const MOVE_SPEED: Fixed = 327680;

/// Jump impulse: 12.0 px/frame = 12 * 65536
pub const JUMP_VELOCITY: Fixed = 786432;

/// Gravity while rising with jump held: 0.6 = floor(0.6 * 65536)
pub const GRAVITY_RISE_HELD: Fixed = 39321;

/// Gravity while rising after jump released: 1.2 = floor(1.2 * 65536)
pub const GRAVITY_RISE: Fixed = 78643;

/// Gravity while falling: 2.0 = 2 * 65536
pub const GRAVITY_FALL: Fixed = 131072;

/// Terminal fall speed: 15.0 px/frame
pub const MAX_FALL_SPEED: Fixed = 983040;

/// Horizontal friction with no input: 0.8 = floor(0.8 * 65536)
pub const FRICTION: Fixed = 52428;

/// Dash speed multiplier at dash level 1: 2.0
pub const DASH_MULTIPLIER: Fixed = 131072;

/// Points per regular enemy defeated
pub const SCORE_PER_ENEMY: u32 = 100;

/// Points per boss defeated
pub const SCORE_PER_BOSS: u32 = 1000;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization (level/config load).
/// NEVER in the tick loop.
///
/// # Example
/// ```
/// use kaya::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Convert a whole number of pixels to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Divide-by-zero returns 0 (not panic).
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Square root using Newton-Raphson iteration.
///
/// Returns 0 for non-positive inputs. Uses exactly 6 iterations.
///
/// Prefer squared distances for comparisons.
#[inline]
pub fn fixed_sqrt(x: Fixed) -> Fixed {
    if x <= 0 {
        return 0;
    }

    let mut guess = (x >> 1).max(1);

    for _ in 0..6 {
        let div = fixed_div(x, guess);
        guess = (guess.wrapping_add(div)) >> 1;

        if guess == 0 {
            guess = 1;
        }
    }

    guess
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

/// Sine of a phase measured in turns (FIXED_ONE = one full cycle).
///
/// Integer-only Bhaskara approximation, max error ≈ 0.0016.
/// Any phase is accepted; it is wrapped into [0, 1) first.
pub fn fixed_sin(phase: Fixed) -> Fixed {
    // FIXED_ONE is a power of two, so masking wraps negatives too
    let turn = phase & (FIXED_ONE - 1);
    let (half, sign) = if turn < FIXED_HALF { (turn, 1) } else { (turn - FIXED_HALF, -1) };

    // p in [0, 1) spans one half-cycle
    let p = half << 1;
    let q = fixed_mul(p, FIXED_ONE - p);
    let value = fixed_div(16 * q, 5 * FIXED_ONE - 4 * q);
    value * sign
}

// =============================================================================
// SERDE ADAPTER
// =============================================================================

/// Serialize a `Fixed` as a decimal float so config and level files stay
/// human-editable. Conversion only happens at load time.
///
/// Use with `#[serde(with = "crate::core::fixed::serde_float")]`.
pub mod serde_float {
    use super::{to_fixed, to_float, Fixed};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write the value as `f64`.
    pub fn serialize<S: Serializer>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_float(*value) as f64)
    }

    /// Read an `f64` and convert.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Ok(to_fixed(raw))
    }
}

// =============================================================================
// FIXEDNUM WRAPPER
// =============================================================================

/// Operator wrapper for formula-heavy code such as camera easing.
///
/// For hot paths, use raw `Fixed` with `fixed_*` functions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedNum(pub Fixed);

impl FixedNum {
    /// Create from integer
    #[inline]
    pub const fn from_int(i: i32) -> Self {
        Self(i << FIXED_SCALE)
    }

    /// Get raw fixed-point value
    #[inline]
    pub const fn raw(self) -> Fixed {
        self.0
    }

    /// Convert to float for display
    #[inline]
    pub fn to_float(self) -> f32 {
        to_float(self.0)
    }
}

impl Add for FixedNum {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for FixedNum {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for FixedNum {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(fixed_mul(self.0, rhs.0))
    }
}

impl Neg for FixedNum {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl fmt::Debug for FixedNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:.4})", self.to_float())
    }
}

impl fmt::Display for FixedNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_float())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
        assert_eq!(from_int(7), to_fixed(7.0));
    }

    #[test]
    fn test_fixed_mul_div() {
        assert_eq!(fixed_mul(to_fixed(2.0), to_fixed(3.0)), to_fixed(6.0));
        assert_eq!(fixed_mul(to_fixed(-2.0), to_fixed(3.0)), to_fixed(-6.0));
        assert_eq!(fixed_div(to_fixed(6.0), to_fixed(2.0)), to_fixed(3.0));
        assert_eq!(fixed_div(FIXED_ONE, 0), 0);
    }

    #[test]
    fn test_fixed_sqrt() {
        let result = fixed_sqrt(to_fixed(4.0));
        assert!((result - to_fixed(2.0)).abs() < 100);
        assert_eq!(fixed_sqrt(0), 0);
        assert_eq!(fixed_sqrt(-FIXED_ONE), 0);
    }

    #[test]
    fn test_movement_constants() {
        assert_eq!(MOVE_SPEED, 5 * FIXED_ONE);
        assert_eq!(JUMP_VELOCITY, 12 * FIXED_ONE);
        assert_eq!(GRAVITY_FALL, 2 * FIXED_ONE);
        assert_eq!(FRICTION, to_fixed(0.8));
        assert_eq!(GRAVITY_RISE_HELD, to_fixed(0.6));
        assert_eq!(GRAVITY_RISE, to_fixed(1.2));
        assert!(GRAVITY_RISE_HELD < GRAVITY_RISE && GRAVITY_RISE < GRAVITY_FALL);
    }

    #[test]
    fn test_fixed_sin_key_points() {
        let tolerance = 200; // ~0.003
        assert_eq!(fixed_sin(0), 0);
        assert!((fixed_sin(FIXED_ONE / 4) - FIXED_ONE).abs() < tolerance);
        assert!(fixed_sin(FIXED_HALF).abs() < tolerance);
        assert!((fixed_sin(3 * FIXED_ONE / 4) + FIXED_ONE).abs() < tolerance);
        // 30 degrees
        assert!((fixed_sin(FIXED_ONE / 12) - FIXED_HALF).abs() < tolerance);
    }

    #[test]
    fn test_fixed_sin_wraps() {
        let phase = FIXED_ONE / 8;
        assert_eq!(fixed_sin(phase), fixed_sin(phase + FIXED_ONE));
        assert_eq!(fixed_sin(phase), fixed_sin(phase - 3 * FIXED_ONE));
        assert_eq!(fixed_sin(-phase), -fixed_sin(phase));
    }

    #[test]
    fn test_fixednum_wrapper() {
        let a = FixedNum::from_int(5);
        let b = FixedNum::from_int(3);
        assert_eq!((a + b).raw(), to_fixed(8.0));
        assert_eq!((a - b).raw(), to_fixed(2.0));
        assert_eq!((a * b).raw(), to_fixed(15.0));
        assert_eq!((-a).raw(), to_fixed(-5.0));
    }
}
