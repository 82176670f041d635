//! Univariate polynomials and rational functions over the rationals
//!
//! Provides:
//! - Dense polynomial arithmetic with a hard degree cap
//! - Euclidean division and gcd
//! - Rational functions reduced to lowest terms
//! - Conversion from the parsed expression tree

use super::{Expr, MathError, MathResult, Rational, MAX_DEGREE, VARIABLE};
use std::fmt;

/// Polynomial in the tutoring variable, coefficients stored lowest power first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coeffs: Vec<Rational>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn constant(value: Rational) -> Self {
        Self::from_coeffs(vec![value])
    }

    /// The monomial `x`
    pub fn variable() -> Self {
        Self::from_coeffs(vec![Rational::ZERO, Rational::ONE])
    }

    /// Build from coefficients (lowest power first), trimming leading zeros
    pub fn from_coeffs(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn from_integers(coeffs: &[i128]) -> Self {
        Self::from_coeffs(coeffs.iter().map(|c| Rational::from_integer(*c)).collect())
    }

    pub fn coeffs(&self) -> &[Rational] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree, with the zero polynomial reported as degree 0
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    pub fn leading(&self) -> Rational {
        self.coeffs.last().copied().unwrap_or(Rational::ZERO)
    }

    pub fn constant_term(&self) -> Rational {
        self.coeffs.first().copied().unwrap_or(Rational::ZERO)
    }

    /// Number of non-zero terms
    pub fn term_count(&self) -> usize {
        self.coeffs.iter().filter(|c| !c.is_zero()).count()
    }

    pub fn add(&self, other: &Self) -> MathResult<Self> {
        let len = self.coeffs.len().max(other.coeffs.len());
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.coeffs.get(i).copied().unwrap_or(Rational::ZERO);
            let b = other.coeffs.get(i).copied().unwrap_or(Rational::ZERO);
            out.push(a.checked_add(&b)?);
        }
        Ok(Self::from_coeffs(out))
    }

    pub fn neg(&self) -> MathResult<Self> {
        self.scale(&Rational::from_integer(-1))
    }

    pub fn sub(&self, other: &Self) -> MathResult<Self> {
        self.add(&other.neg()?)
    }

    pub fn scale(&self, factor: &Rational) -> MathResult<Self> {
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| c.checked_mul(factor))
            .collect::<MathResult<Vec<_>>>()?;
        Ok(Self::from_coeffs(coeffs))
    }

    pub fn mul(&self, other: &Self) -> MathResult<Self> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }
        let degree = self.degree() + other.degree();
        if degree > MAX_DEGREE {
            return Err(MathError::DegreeTooLarge { degree, max: MAX_DEGREE });
        }

        let mut out = vec![Rational::ZERO; degree + 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j].checked_add(&a.checked_mul(b)?)?;
            }
        }
        Ok(Self::from_coeffs(out))
    }

    pub fn pow(&self, exponent: u32) -> MathResult<Self> {
        if exponent == 0 {
            return Ok(Self::constant(Rational::ONE));
        }
        if self.is_constant() {
            return Ok(Self::constant(self.constant_term().checked_pow(i64::from(exponent))?));
        }
        let degree = self.degree().saturating_mul(exponent as usize);
        if degree > MAX_DEGREE {
            return Err(MathError::DegreeTooLarge { degree, max: MAX_DEGREE });
        }

        let mut acc = self.clone();
        for _ in 1..exponent {
            acc = acc.mul(self)?;
        }
        Ok(acc)
    }

    pub fn derivative(&self) -> MathResult<Self> {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, c)| c.checked_mul(&Rational::from_integer(power as i128)))
            .collect::<MathResult<Vec<_>>>()?;
        Ok(Self::from_coeffs(coeffs))
    }

    /// Exact evaluation (Horner)
    pub fn eval(&self, at: &Rational) -> MathResult<Rational> {
        let mut acc = Rational::ZERO;
        for c in self.coeffs.iter().rev() {
            acc = acc.checked_mul(at)?.checked_add(c)?;
        }
        Ok(acc)
    }

    pub fn eval_f64(&self, at: f64) -> f64 {
        self.coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * at + c.to_f64())
    }

    /// Euclidean division: `self = quotient * divisor + remainder`
    pub fn div_rem(&self, divisor: &Self) -> MathResult<(Self, Self)> {
        if divisor.is_zero() {
            return Err(MathError::DivisionByZero);
        }

        let mut remainder = self.coeffs.clone();
        let lead = divisor.leading();
        let dd = divisor.degree();

        if self.is_zero() || self.degree() < dd {
            return Ok((Self::zero(), self.clone()));
        }

        let mut quotient = vec![Rational::ZERO; self.degree() - dd + 1];
        for k in (0..quotient.len()).rev() {
            let factor = remainder[k + dd].checked_div(&lead)?;
            quotient[k] = factor;
            if factor.is_zero() {
                continue;
            }
            for (j, d) in divisor.coeffs.iter().enumerate() {
                remainder[k + j] = remainder[k + j].checked_sub(&factor.checked_mul(d)?)?;
            }
        }

        remainder.truncate(dd);
        Ok((Self::from_coeffs(quotient), Self::from_coeffs(remainder)))
    }

    /// Monic greatest common divisor (zero only when both inputs are zero)
    pub fn gcd(&self, other: &Self) -> MathResult<Self> {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b)?;
            a = b;
            b = r;
        }
        a.monic()
    }

    pub fn monic(&self) -> MathResult<Self> {
        if self.is_zero() {
            return Ok(Self::zero());
        }
        self.scale(&self.leading().recip()?)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        let mut first = true;
        for (power, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }

            let sign = if c.is_negative() { "-" } else { "+" };
            if first {
                if c.is_negative() {
                    write!(f, "-")?;
                }
            } else {
                write!(f, " {} ", sign)?;
            }
            first = false;

            let magnitude = c.abs();
            if power == 0 {
                write!(f, "{}", magnitude)?;
                continue;
            }

            // 3x^2, x^2/2, 3x/4
            if magnitude.numer() != 1 {
                write!(f, "{}", magnitude.numer())?;
            }
            write!(f, "{}", VARIABLE)?;
            if power > 1 {
                write!(f, "^{}", power)?;
            }
            if magnitude.denom() != 1 {
                write!(f, "/{}", magnitude.denom())?;
            }
        }
        Ok(())
    }
}

/// Quotient of two polynomials, kept in lowest terms with a monic denominator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalFunction {
    numerator: Polynomial,
    denominator: Polynomial,
}

impl RationalFunction {
    pub fn new(numerator: Polynomial, denominator: Polynomial) -> MathResult<Self> {
        if denominator.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        if numerator.is_zero() {
            return Ok(Self::from_polynomial(Polynomial::zero()));
        }

        let common = numerator.gcd(&denominator)?;
        let (numerator, _) = numerator.div_rem(&common)?;
        let (denominator, _) = denominator.div_rem(&common)?;

        let lead = denominator.leading().recip()?;
        Ok(Self {
            numerator: numerator.scale(&lead)?,
            denominator: denominator.scale(&lead)?,
        })
    }

    pub fn from_polynomial(poly: Polynomial) -> Self {
        Self {
            numerator: poly,
            denominator: Polynomial::constant(Rational::ONE),
        }
    }

    pub fn constant(value: Rational) -> Self {
        Self::from_polynomial(Polynomial::constant(value))
    }

    pub fn numerator(&self) -> &Polynomial {
        &self.numerator
    }

    pub fn denominator(&self) -> &Polynomial {
        &self.denominator
    }

    pub fn is_polynomial(&self) -> bool {
        self.denominator.is_constant()
    }

    pub fn into_polynomial(self) -> Option<Polynomial> {
        if self.is_polynomial() {
            Some(self.numerator)
        } else {
            None
        }
    }

    /// Constant value, if the function does not depend on the variable
    pub fn as_constant(&self) -> Option<Rational> {
        if self.is_polynomial() && self.numerator.is_constant() {
            Some(self.numerator.constant_term())
        } else {
            None
        }
    }

    pub fn add(&self, other: &Self) -> MathResult<Self> {
        let numerator = self
            .numerator
            .mul(&other.denominator)?
            .add(&other.numerator.mul(&self.denominator)?)?;
        let denominator = self.denominator.mul(&other.denominator)?;
        Self::new(numerator, denominator)
    }

    pub fn neg(&self) -> MathResult<Self> {
        Ok(Self {
            numerator: self.numerator.neg()?,
            denominator: self.denominator.clone(),
        })
    }

    pub fn sub(&self, other: &Self) -> MathResult<Self> {
        self.add(&other.neg()?)
    }

    pub fn mul(&self, other: &Self) -> MathResult<Self> {
        Self::new(
            self.numerator.mul(&other.numerator)?,
            self.denominator.mul(&other.denominator)?,
        )
    }

    pub fn div(&self, other: &Self) -> MathResult<Self> {
        if other.numerator.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Self::new(
            self.numerator.mul(&other.denominator)?,
            self.denominator.mul(&other.numerator)?,
        )
    }

    pub fn powi(&self, exponent: i64) -> MathResult<Self> {
        if let Some(value) = self.as_constant() {
            return Ok(Self::constant(value.checked_pow(exponent)?));
        }

        let magnitude = u32::try_from(exponent.unsigned_abs()).map_err(|_| {
            MathError::DegreeTooLarge { degree: usize::MAX, max: MAX_DEGREE }
        })?;
        let raised = Self {
            numerator: self.numerator.pow(magnitude)?,
            denominator: self.denominator.pow(magnitude)?,
        };

        if exponent < 0 {
            Self::constant(Rational::ONE).div(&raised)
        } else {
            Ok(raised)
        }
    }

    /// Quotient rule, reduced to lowest terms
    pub fn derivative(&self) -> MathResult<Self> {
        let numerator = self
            .numerator
            .derivative()?
            .mul(&self.denominator)?
            .sub(&self.numerator.mul(&self.denominator.derivative()?)?)?;
        let denominator = self.denominator.pow(2)?;
        Self::new(numerator, denominator)
    }

    /// Convert an expression tree; only the tutoring variable may appear
    pub fn from_expr(expr: &Expr) -> MathResult<Self> {
        match expr {
            Expr::Number(value) => Ok(Self::constant(*value)),
            Expr::Symbol(c) if *c == VARIABLE => Ok(Self::from_polynomial(Polynomial::variable())),
            Expr::Symbol(c) => Err(MathError::UnsupportedSymbol(*c)),
            Expr::Neg(inner) => Self::from_expr(inner)?.neg(),
            Expr::Add(a, b) => Self::from_expr(a)?.add(&Self::from_expr(b)?),
            Expr::Sub(a, b) => Self::from_expr(a)?.sub(&Self::from_expr(b)?),
            Expr::Mul(a, b) => Self::from_expr(a)?.mul(&Self::from_expr(b)?),
            Expr::Div(a, b) => Self::from_expr(a)?.div(&Self::from_expr(b)?),
            Expr::Pow(base, exponent) => {
                let exponent = Self::from_expr(exponent)?
                    .as_constant()
                    .filter(|e| e.is_integer())
                    .ok_or(MathError::NonIntegerExponent)?;
                let exponent =
                    i64::try_from(exponent.numer()).map_err(|_| MathError::Overflow)?;
                Self::from_expr(base)?.powi(exponent)
            }
        }
    }
}

impl fmt::Display for RationalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_polynomial() {
            return write!(f, "{}", self.numerator);
        }

        if self.numerator.term_count() > 1 {
            write!(f, "({})", self.numerator)?;
        } else {
            write!(f, "{}", self.numerator)?;
        }
        if self.denominator.term_count() > 1 {
            write!(f, "/({})", self.denominator)
        } else {
            write!(f, "/{}", self.denominator)
        }
    }
}
