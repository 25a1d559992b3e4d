//! Integer lengths in the engine's internal unit.
//!
//! One DTP point (1/72 inch) is 65536 scaled points. PDF user space uses the
//! same point, so converting for output is a single division.
//!
//! Widths come straight from scripts, so the operators saturate at the ends
//! of the `i64` range instead of overflowing.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Scaled points per DTP point.
pub const SP_PER_PT: i64 = 65536;

/// A length stored as a whole number of scaled points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledPoint(pub i64);

impl ScaledPoint {
    pub const ZERO: ScaledPoint = ScaledPoint(0);

    pub const fn new(sp: i64) -> Self {
        Self(sp)
    }

    /// Converts from DTP points, rounding to the nearest scaled point.
    pub fn from_pt(pt: f64) -> Self {
        Self((pt * SP_PER_PT as f64).round() as i64)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn to_pt(self) -> f64 {
        self.0 as f64 / SP_PER_PT as f64
    }

    /// Value in PDF user space units.
    pub fn to_bp(self) -> f32 {
        self.to_pt() as f32
    }

    /// Scales by a floating point factor, rounding to the nearest scaled point.
    pub fn scale(self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }

    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }
}

impl fmt::Display for ScaledPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.to_pt())
    }
}

impl From<i64> for ScaledPoint {
    fn from(sp: i64) -> Self {
        Self(sp)
    }
}

impl Add for ScaledPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for ScaledPoint {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for ScaledPoint {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for ScaledPoint {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for ScaledPoint {
    type Output = Self;
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i64> for ScaledPoint {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for ScaledPoint {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        if rhs == 0 {
            return Self::ZERO;
        }
        Self(self.0.saturating_div(rhs))
    }
}

impl Sum for ScaledPoint {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ScaledPoint::ZERO, Add::add)
    }
}
