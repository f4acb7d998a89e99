//! The scalar type used for every planar coordinate.
//!
//! Two build variants exist, selected by the `float-dim` feature:
//! a 64-bit fixed-point integer with an implicit power-of-ten denominator
//! (the default — exact boolean results for integer-coordinate input), or
//! an `f64` fallback kept around for debugging against the fixed-point path.
//! Geometric code never matches on the variant; it only uses the operators
//! and conversions below.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Fixed-point denominator. 10^3 gives micron resolution for millimeter models.
pub const DENOM: i64 = 1_000;

#[cfg(not(feature = "float-dim"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dim(i64);

#[cfg(feature = "float-dim")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Dim(f64);

#[cfg(feature = "float-dim")]
impl PartialEq for Dim {
    fn eq(&self, other: &Dim) -> bool {
        self.0 == other.0
    }
}

#[cfg(feature = "float-dim")]
impl PartialOrd for Dim {
    fn partial_cmp(&self, other: &Dim) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Dim {
    pub const ZERO: Dim = Dim::from_raw(0);

    #[cfg(not(feature = "float-dim"))]
    pub const fn from_raw(raw: i64) -> Dim {
        Dim(raw)
    }

    #[cfg(feature = "float-dim")]
    pub const fn from_raw(raw: i64) -> Dim {
        Dim(raw as f64)
    }

    /// `from_real(r) = round(r * D)`
    #[cfg(not(feature = "float-dim"))]
    pub fn from_real(r: f64) -> Dim {
        Dim((r * DENOM as f64).round() as i64)
    }

    #[cfg(feature = "float-dim")]
    pub fn from_real(r: f64) -> Dim {
        Dim(r)
    }

    /// `to_real(d) = d / D`
    #[cfg(not(feature = "float-dim"))]
    pub fn to_real(self) -> f64 {
        self.0 as f64 / DENOM as f64
    }

    #[cfg(feature = "float-dim")]
    pub fn to_real(self) -> f64 {
        self.0
    }

    /// One unit of least precision for this representation: `1` for fixed
    /// point, a relative epsilon scaled by `scale` for float.
    pub fn epsilon(scale: Dim) -> Dim {
        #[cfg(not(feature = "float-dim"))]
        {
            let _ = scale;
            Dim(1)
        }
        #[cfg(feature = "float-dim")]
        {
            Dim(scale.0.abs() * f64::EPSILON)
        }
    }

    pub fn min(self, other: Dim) -> Dim {
        if other < self {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Dim) -> Dim {
        if other > self {
            other
        } else {
            self
        }
    }

    pub fn abs(self) -> Dim {
        #[cfg(not(feature = "float-dim"))]
        {
            Dim(self.0.abs())
        }
        #[cfg(feature = "float-dim")]
        {
            Dim(self.0.abs())
        }
    }

    pub fn is_zero(self) -> bool {
        self == Dim::ZERO
    }

    pub fn signum(self) -> i32 {
        match self.0.partial_cmp(&Self::ZERO.0) {
            Some(Ordering::Less) => -1,
            Some(Ordering::Greater) => 1,
            _ => 0,
        }
    }

    /// Raw underlying integer numerator (fixed-point builds only; used by
    /// the clipper's exact-intersection arithmetic).
    #[cfg(not(feature = "float-dim"))]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Render with `places` decimal digits, trimming trailing zeros and a
    /// trailing decimal point. The sole way distances reach external text
    /// output (G-code, SVG).
    pub fn format(self, places: u32) -> String {
        let mut s = format!("{:.*}", places as usize, self.to_real());
        if places > 0 {
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
        }
        if s.is_empty() || s == "-" {
            s = "0".to_string();
        }
        s
    }
}

impl From<i64> for Dim {
    fn from(v: i64) -> Dim {
        Dim::from_raw(v)
    }
}

impl Add for Dim {
    type Output = Dim;
    fn add(self, rhs: Dim) -> Dim {
        Dim(self.0 + rhs.0)
    }
}

impl AddAssign for Dim {
    fn add_assign(&mut self, rhs: Dim) {
        self.0 += rhs.0;
    }
}

impl Sub for Dim {
    type Output = Dim;
    fn sub(self, rhs: Dim) -> Dim {
        Dim(self.0 - rhs.0)
    }
}

impl SubAssign for Dim {
    fn sub_assign(&mut self, rhs: Dim) {
        self.0 -= rhs.0;
    }
}

impl Neg for Dim {
    type Output = Dim;
    fn neg(self) -> Dim {
        Dim(-self.0)
    }
}

#[cfg(not(feature = "float-dim"))]
impl Mul<i64> for Dim {
    type Output = Dim;
    fn mul(self, rhs: i64) -> Dim {
        Dim(self.0 * rhs)
    }
}

#[cfg(feature = "float-dim")]
impl Mul<i64> for Dim {
    type Output = Dim;
    fn mul(self, rhs: i64) -> Dim {
        Dim(self.0 * rhs as f64)
    }
}

impl Mul<f64> for Dim {
    type Output = Dim;
    fn mul(self, rhs: f64) -> Dim {
        Dim::from_real(self.to_real() * rhs)
    }
}

impl Div<i64> for Dim {
    type Output = Dim;
    fn div(self, rhs: i64) -> Dim {
        #[cfg(not(feature = "float-dim"))]
        {
            Dim(self.0 / rhs)
        }
        #[cfg(feature = "float-dim")]
        {
            Dim(self.0 / rhs as f64)
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(3))
    }
}

#[cfg(not(feature = "float-dim"))]
impl PartialEq<i64> for Dim {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}
