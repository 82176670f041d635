//! Exact rational numbers
//!
//! Every operation is checked: overflow and division by zero surface as
//! `MathError` values instead of panics, so arbitrary user input can flow
//! through the algebra core safely.

use super::{MathError, MathResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A normalized fraction `num / den` with `den > 0` and `gcd(num, den) == 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    num: i128,
    den: i128,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build a reduced fraction
    pub fn new(num: i128, den: i128) -> MathResult<Self> {
        if den == 0 {
            return Err(MathError::DivisionByZero);
        }
        if num == i128::MIN || den == i128::MIN {
            return Err(MathError::Overflow);
        }

        let g = gcd(num, den);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = -num;
            den = -den;
        }

        Ok(Self { num, den })
    }

    /// Integer value as a rational
    pub const fn from_integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Parse an unsigned decimal literal such as `12`, `2.5` or `.75`
    pub fn parse_decimal(text: &str) -> MathResult<Self> {
        let invalid = || MathError::Parse {
            message: format!("invalid number '{}'", text),
            position: 0,
        };

        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut num: i128 = 0;
        let mut den: i128 = 1;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            num = num
                .checked_mul(10)
                .and_then(|n| n.checked_add(i128::from(digit - b'0')))
                .ok_or(MathError::Overflow)?;
        }
        for _ in 0..frac_part.len() {
            den = den.checked_mul(10).ok_or(MathError::Overflow)?;
        }

        Self::new(num, den)
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn abs(&self) -> Self {
        Self { num: self.num.abs(), den: self.den }
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn checked_neg(&self) -> MathResult<Self> {
        Ok(Self {
            num: self.num.checked_neg().ok_or(MathError::Overflow)?,
            den: self.den,
        })
    }

    pub fn checked_add(&self, other: &Self) -> MathResult<Self> {
        let g = gcd(self.den, other.den);
        let left = self.num.checked_mul(other.den / g);
        let right = other.num.checked_mul(self.den / g);
        let num = match (left, right) {
            (Some(l), Some(r)) => l.checked_add(r),
            _ => None,
        }
        .ok_or(MathError::Overflow)?;
        let den = self.den.checked_mul(other.den / g).ok_or(MathError::Overflow)?;
        Self::new(num, den)
    }

    pub fn checked_sub(&self, other: &Self) -> MathResult<Self> {
        self.checked_add(&other.checked_neg()?)
    }

    pub fn checked_mul(&self, other: &Self) -> MathResult<Self> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::ZERO);
        }
        let g1 = gcd(self.num, other.den);
        let g2 = gcd(other.num, self.den);
        let num = (self.num / g1)
            .checked_mul(other.num / g2)
            .ok_or(MathError::Overflow)?;
        let den = (self.den / g2)
            .checked_mul(other.den / g1)
            .ok_or(MathError::Overflow)?;
        Self::new(num, den)
    }

    pub fn recip(&self) -> MathResult<Self> {
        Self::new(self.den, self.num)
    }

    pub fn checked_div(&self, other: &Self) -> MathResult<Self> {
        self.checked_mul(&other.recip()?)
    }

    /// Integer power; negative exponents invert first
    pub fn checked_pow(&self, exponent: i64) -> MathResult<Self> {
        let mut base = if exponent < 0 { self.recip()? } else { *self };
        let mut remaining = exponent.unsigned_abs();
        let mut acc = Self::ONE;

        while remaining > 0 {
            if remaining & 1 == 1 {
                acc = acc.checked_mul(&base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.checked_mul(&base)?;
            }
        }

        Ok(acc)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.num.checked_mul(other.den), other.num.checked_mul(self.den)) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(i128::from(value))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Greatest common divisor, always positive (1 for `gcd(0, 0)`)
pub(crate) fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        1
    } else {
        // callers reject i128::MIN, so the gcd always fits
        a as i128
    }
}
