//! Root finding and factoring over the rationals
//!
//! Provides:
//! - Rational roots via the rational-root theorem, with multiplicity
//! - Exact quadratic roots in surd form (`1/2 - sqrt(5)/2`, `-1 + 2*I`)
//! - Numeric real roots for higher-degree residuals
//! - Factorization into content, linear factors and an irreducible residual

use super::{Expr, MathError, MathResult, Polynomial, Rational, RationalFunction};
use std::cmp::Ordering;
use std::fmt;

/// Rational-root candidates come from divisors of the constant and leading
/// coefficients; above this size the search is skipped
const DIVISOR_SEARCH_LIMIT: i128 = 10_000_000_000;

/// Most `p/q` pairs one rational-root search may visit
const CANDIDATE_LIMIT: usize = 250_000;

/// Trial-division cap when pulling square factors out of a discriminant
const SQUARE_SEARCH_LIMIT: i128 = 1_000_000;

const BISECTION_STEPS: usize = 200;

/// A single solution of a polynomial equation
#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    /// Exact rational value
    Exact(Rational),

    /// `rational + coeff * sqrt(radicand)`; a negative radicand is imaginary
    Surd {
        rational: Rational,
        coeff: Rational,
        radicand: i128,
    },

    /// Real root located numerically
    Approximate(f64),
}

impl Root {
    pub fn is_real(&self) -> bool {
        !matches!(self, Root::Surd { radicand, .. } if *radicand < 0)
    }

    fn real_part(&self) -> f64 {
        match self {
            Root::Exact(v) => v.to_f64(),
            Root::Surd { rational, coeff, radicand } if *radicand > 0 => {
                rational.to_f64() + coeff.to_f64() * (*radicand as f64).sqrt()
            }
            Root::Surd { rational, .. } => rational.to_f64(),
            Root::Approximate(v) => *v,
        }
    }

    fn imaginary_part(&self) -> f64 {
        match self {
            Root::Surd { coeff, radicand, .. } if *radicand < 0 => {
                coeff.to_f64() * (radicand.unsigned_abs() as f64).sqrt()
            }
            _ => 0.0,
        }
    }

    fn sort_key(&self) -> (bool, f64, f64) {
        (!self.is_real(), self.real_part(), self.imaginary_part())
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Exact(value) => write!(f, "{}", value),
            Root::Approximate(value) => write!(f, "{}", format_approximate(*value)),
            Root::Surd { rational, coeff, radicand } => {
                let surd = match *radicand {
                    -1 => "I".to_string(),
                    r if r < 0 => format!("sqrt({})*I", r.unsigned_abs()),
                    r => format!("sqrt({})", r),
                };
                let magnitude = coeff.abs();
                let mut term = if magnitude.numer() == 1 {
                    surd
                } else {
                    format!("{}*{}", magnitude.numer(), surd)
                };
                if magnitude.denom() != 1 {
                    term = format!("{}/{}", term, magnitude.denom());
                }

                match (rational.is_zero(), coeff.is_negative()) {
                    (true, true) => write!(f, "-{}", term),
                    (true, false) => write!(f, "{}", term),
                    (false, true) => write!(f, "{} - {}", rational, term),
                    (false, false) => write!(f, "{} + {}", rational, term),
                }
            }
        }
    }
}

/// Solutions of an equation in the tutoring variable
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionSet {
    /// Distinct solutions: reals ascending, then complex values
    Finite(Vec<Root>),
    /// The equation holds for every value of the variable
    AllValues,
}

impl SolutionSet {
    pub fn is_empty(&self) -> bool {
        matches!(self, SolutionSet::Finite(roots) if roots.is_empty())
    }
}

impl fmt::Display for SolutionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionSet::AllValues => write!(f, "all real numbers"),
            SolutionSet::Finite(roots) => {
                let rendered: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Solve `lhs = rhs` for the tutoring variable
pub fn solve_equation(lhs: &Expr, rhs: &Expr) -> MathResult<SolutionSet> {
    let difference = RationalFunction::from_expr(lhs)?.sub(&RationalFunction::from_expr(rhs)?)?;
    if difference.numerator().is_zero() {
        return Ok(SolutionSet::AllValues);
    }

    let denominator = difference.denominator();
    let mut roots = polynomial_roots(difference.numerator())?;

    let mut kept = Vec::with_capacity(roots.len());
    for root in roots.drain(..) {
        if let Root::Exact(value) = &root {
            if denominator.eval(value)?.is_zero() {
                continue;
            }
        }
        kept.push(root);
    }

    Ok(SolutionSet::Finite(kept))
}

/// Distinct roots of a polynomial, sorted
pub fn polynomial_roots(poly: &Polynomial) -> MathResult<Vec<Root>> {
    if poly.is_constant() {
        return Ok(Vec::new());
    }

    let (_, primitive) = integer_primitive(poly)?;
    let (rational_roots, residual) = extract_rational_roots(&primitive)?;

    let mut roots: Vec<Root> = rational_roots
        .into_iter()
        .map(|(value, _)| Root::Exact(value))
        .collect();

    match residual.degree() {
        0 => {}
        1 => {
            let value = residual
                .constant_term()
                .checked_neg()?
                .checked_div(&residual.leading())?;
            roots.push(Root::Exact(value));
        }
        2 => roots.extend(quadratic_roots(
            &residual.coeffs()[2],
            &residual.coeffs()[1],
            &residual.coeffs()[0],
        )?),
        _ => {
            let coeffs: Vec<f64> = residual.coeffs().iter().map(|c| c.to_f64()).collect();
            roots.extend(real_roots_numeric(&coeffs).into_iter().map(Root::Approximate));
        }
    }

    roots.sort_by(|a, b| {
        let (ka, kb) = (a.sort_key(), b.sort_key());
        ka.0
            .cmp(&kb.0)
            .then(ka.1.total_cmp(&kb.1))
            .then(ka.2.total_cmp(&kb.2))
    });
    roots.dedup();
    Ok(roots)
}

fn quadratic_roots(a: &Rational, b: &Rational, c: &Rational) -> MathResult<Vec<Root>> {
    let two_a = a.checked_mul(&Rational::from_integer(2))?;
    let discriminant = b
        .checked_mul(b)?
        .checked_sub(&Rational::from_integer(4).checked_mul(a)?.checked_mul(c)?)?;
    let vertex = b.checked_neg()?.checked_div(&two_a)?;

    if discriminant.is_zero() {
        return Ok(vec![Root::Exact(vertex)]);
    }

    // sqrt(n/d) = sqrt(n*d)/d
    let scaled = discriminant
        .numer()
        .checked_mul(discriminant.denom())
        .ok_or(MathError::Overflow)?;
    let (square, rest) = split_square(scaled.abs());
    let radicand = if scaled < 0 { -rest } else { rest };

    let coeff = Rational::new(square, discriminant.denom())?
        .checked_div(&two_a)?
        .abs();

    if radicand == 1 {
        return Ok(vec![
            Root::Exact(vertex.checked_sub(&coeff)?),
            Root::Exact(vertex.checked_add(&coeff)?),
        ]);
    }

    Ok(vec![
        Root::Surd { rational: vertex, coeff: coeff.checked_neg()?, radicand },
        Root::Surd { rational: vertex, coeff, radicand },
    ])
}

/// Write `value = square^2 * rest`, pulling out as many square factors as
/// trial division finds
fn split_square(value: i128) -> (i128, i128) {
    let mut square = 1;
    let mut rest = value;
    let mut i: i128 = 2;

    while i <= SQUARE_SEARCH_LIMIT && i * i <= rest {
        while rest % (i * i) == 0 {
            rest /= i * i;
            square *= i;
        }
        i += 1;
    }

    (square, rest)
}

/// Real roots of a float polynomial (lowest power first) by bisecting between
/// consecutive critical points
fn real_roots_numeric(coeffs: &[f64]) -> Vec<f64> {
    let degree = coeffs.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }
    if degree == 1 {
        return vec![-coeffs[0] / coeffs[1]];
    }

    let eval = |x: f64| coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c);
    let derivative: Vec<f64> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| c * k as f64)
        .collect();

    let lead = coeffs[degree];
    let bound = 1.0
        + coeffs[..degree]
            .iter()
            .map(|c| (c / lead).abs())
            .fold(0.0, f64::max);

    let mut points = vec![-bound];
    points.extend(
        real_roots_numeric(&derivative)
            .into_iter()
            .filter(|c| c.abs() < bound),
    );
    points.push(bound);
    points.sort_by(f64::total_cmp);

    let tolerance = 1e-10;
    let mut roots: Vec<f64> = Vec::new();
    for window in points.windows(2) {
        let (mut lo, mut hi) = (window[0], window[1]);
        let (f_lo, f_hi) = (eval(lo), eval(hi));

        if f_lo.abs() <= tolerance {
            roots.push(lo);
            continue;
        }
        if f_hi.abs() <= tolerance || f_lo.signum() == f_hi.signum() {
            continue;
        }

        for _ in 0..BISECTION_STEPS {
            let mid = (lo + hi) / 2.0;
            if eval(mid).signum() == f_lo.signum() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        roots.push((lo + hi) / 2.0);
    }
    if let Some(&last) = points.last() {
        if eval(last).abs() <= tolerance {
            roots.push(last);
        }
    }

    roots.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    roots
}

fn format_approximate(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Split a polynomial into rational content and an integer-coefficient
/// primitive part with positive leading coefficient
fn integer_primitive(poly: &Polynomial) -> MathResult<(Rational, Polynomial)> {
    let mut lcm: i128 = 1;
    for c in poly.coeffs() {
        let g = super::rational::gcd(lcm, c.denom());
        lcm = (lcm / g).checked_mul(c.denom()).ok_or(MathError::Overflow)?;
    }

    let scaled = poly.scale(&Rational::from_integer(lcm))?;
    let mut content: i128 = 0;
    for c in scaled.coeffs().iter().filter(|c| !c.is_zero()) {
        content = super::rational::gcd(content, c.numer());
    }
    if scaled.leading().is_negative() {
        content = -content;
    }

    let primitive = scaled.scale(&Rational::new(1, content)?)?;
    Ok((Rational::new(content, lcm)?, primitive))
}

/// Positive divisors of `n`, ascending
fn divisors(n: i128) -> Vec<i128> {
    let n = n.abs();
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut i: i128 = 1;
    while i * i <= n {
        if n % i == 0 {
            small.push(i);
            if i != n / i {
                large.push(n / i);
            }
        }
        i += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

/// Primitive integer linear factor `b*x - a` for the root `a/b`
fn linear_factor(root: &Rational) -> Polynomial {
    Polynomial::from_integers(&[-root.numer(), root.denom()])
}

/// Cauchy bounds on the magnitude of the nonzero roots, widened slightly so
/// float rounding never drops a true root
fn root_bounds(poly: &Polynomial) -> (f64, f64) {
    let coeffs: Vec<f64> = poly.coeffs().iter().map(|c| c.to_f64().abs()).collect();
    let degree = coeffs.len() - 1;

    let upper = 1.0 + coeffs[..degree].iter().fold(0.0, |m: f64, c| m.max(c / coeffs[degree]));
    let lower = 1.0 / (1.0 + coeffs[1..].iter().fold(0.0, |m: f64, c| m.max(c / coeffs[0])));
    (lower * (1.0 - 1e-9), upper * (1.0 + 1e-9))
}

/// Overflow while evaluating means the value is far from zero
fn is_root(poly: &Polynomial, candidate: &Rational) -> bool {
    matches!(poly.eval(candidate), Ok(value) if value.is_zero())
}

/// Rational roots with multiplicity, plus what is left after dividing them out
fn extract_rational_roots(primitive: &Polynomial) -> MathResult<(Vec<(Rational, u32)>, Polynomial)> {
    let mut found = Vec::new();
    let mut poly = primitive.clone();

    let mut zero_multiplicity = 0;
    while poly.degree() > 0 && poly.constant_term().is_zero() {
        poly = Polynomial::from_coeffs(poly.coeffs()[1..].to_vec());
        zero_multiplicity += 1;
    }
    if zero_multiplicity > 0 {
        found.push((Rational::ZERO, zero_multiplicity));
    }

    if poly.degree() == 0 {
        return Ok((found, poly));
    }

    let a0 = poly.constant_term().numer();
    let an = poly.leading().numer();
    if a0.abs() > DIVISOR_SEARCH_LIMIT || an.abs() > DIVISOR_SEARCH_LIMIT {
        tracing::debug!(a0, an, "coefficients too large for rational root search");
        return Ok((found, poly));
    }

    let (lower, upper) = root_bounds(&poly);
    let mut visited = 0;

    'search: for q in divisors(an) {
        for p in divisors(a0) {
            let magnitude = p as f64 / q as f64;
            if magnitude > upper {
                break;
            }
            if magnitude < lower {
                continue;
            }

            visited += 1;
            if visited > CANDIDATE_LIMIT {
                tracing::debug!(a0, an, "rational root search hit its candidate limit");
                break 'search;
            }
            if super::rational::gcd(p, q) != 1 {
                continue;
            }

            for sign in [-1, 1] {
                let candidate = Rational::new(sign * p, q)?;

                let mut multiplicity = 0;
                while poly.degree() > 0 && is_root(&poly, &candidate) {
                    poly = poly.div_rem(&linear_factor(&candidate))?.0;
                    multiplicity += 1;
                }
                if multiplicity > 0 {
                    found.push((candidate, multiplicity));
                }
                if poly.degree() == 0 {
                    break 'search;
                }
            }
        }
    }

    Ok((found, poly))
}

/// A polynomial written as `content * product(factor^multiplicity)`
#[derive(Debug, Clone, PartialEq)]
pub struct Factorization {
    pub content: Rational,
    pub factors: Vec<(Polynomial, u32)>,
}

/// Factor over the rationals
pub fn factor_polynomial(poly: &Polynomial) -> MathResult<Factorization> {
    if poly.is_constant() {
        return Ok(Factorization {
            content: poly.constant_term(),
            factors: Vec::new(),
        });
    }

    let (mut content, primitive) = integer_primitive(poly)?;
    let (roots, residual) = extract_rational_roots(&primitive)?;

    let mut factors: Vec<(Polynomial, u32)> = roots
        .iter()
        .map(|(root, multiplicity)| (linear_factor(root), *multiplicity))
        .collect();

    if residual.degree() >= 1 {
        factors.push((residual, 1));
    } else {
        content = content.checked_mul(&residual.constant_term())?;
    }

    factors.sort_by(|(a, _), (b, _)| factor_order(a, b));
    Ok(Factorization { content, factors })
}

fn factor_order(a: &Polynomial, b: &Polynomial) -> Ordering {
    let is_monomial = |p: &Polynomial| p.term_count() == 1;
    let ratio = |p: &Polynomial| {
        p.constant_term()
            .checked_div(&p.leading())
            .unwrap_or(Rational::ZERO)
    };

    a.degree()
        .cmp(&b.degree())
        .then(is_monomial(b).cmp(&is_monomial(a)))
        .then(ratio(a).cmp(&ratio(b)))
}

impl fmt::Display for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "{}", self.content);
        }

        let magnitude = self.content.abs();
        let mut head = String::new();
        if self.content.is_negative() {
            head.push('-');
        }
        if magnitude.numer() != 1 {
            head.push_str(&magnitude.numer().to_string());
        }
        let tail = if magnitude.denom() != 1 {
            format!("/{}", magnitude.denom())
        } else {
            String::new()
        };

        let bare = head.is_empty() && tail.is_empty() && self.factors.len() == 1 && self.factors[0].1 == 1;
        write!(f, "{}", head)?;
        for (factor, multiplicity) in &self.factors {
            if factor.term_count() > 1 && !bare {
                write!(f, "({})", factor)?;
            } else {
                write!(f, "{}", factor)?;
            }
            if *multiplicity > 1 {
                write!(f, "^{}", multiplicity)?;
            }
        }
        write!(f, "{}", tail)
    }
}

/// Render `expr` expanded; rational expressions expand numerator and denominator
pub fn expand(expr: &Expr) -> MathResult<String> {
    Ok(RationalFunction::from_expr(expr)?.to_string())
}

/// Derivative with respect to the tutoring variable
pub fn differentiate(expr: &Expr) -> MathResult<String> {
    Ok(RationalFunction::from_expr(expr)?.derivative()?.to_string())
}

/// Factor a polynomial expression; rational expressions factor their numerator
/// over their denominator
pub fn factor(expr: &Expr) -> MathResult<String> {
    let function = RationalFunction::from_expr(expr)?;
    let numerator = factor_polynomial(function.numerator())?;
    if function.is_polynomial() {
        return Ok(numerator.to_string());
    }

    let denominator = factor_polynomial(function.denominator())?;
    let needs_parens = |f: &Factorization| {
        f.factors.len() > 1 || f.factors.first().is_some_and(|(p, _)| p.term_count() > 1)
    };
    let wrap = |f: &Factorization| {
        if needs_parens(f) && f.content.is_one() {
            format!("({})", f)
        } else {
            f.to_string()
        }
    };

    Ok(format!("{}/{}", wrap(&numerator), wrap(&denominator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::parse;

    fn solve_text(lhs: &str, rhs: &str) -> String {
        solve_equation(&parse(lhs).unwrap(), &parse(rhs).unwrap())
            .unwrap()
            .to_string()
    }

    fn factor_text(input: &str) -> String {
        factor(&parse(input).unwrap()).unwrap()
    }

    #[test]
    fn test_linear_equation() {
        assert_eq!(solve_text("2*x + 3", "13"), "[5]");
        assert_eq!(solve_text("5*x - 7", "3*x + 4"), "[11/2]");
    }

    #[test]
    fn test_quadratic_equations() {
        assert_eq!(solve_text("x^2 + 5*x + 6", "0"), "[-3, -2]");
        assert_eq!(solve_text("x^2", "2"), "[-sqrt(2), sqrt(2)]");
        assert_eq!(solve_text("x^2 - x - 1", "0"), "[1/2 - sqrt(5)/2, 1/2 + sqrt(5)/2]");
        assert_eq!(solve_text("x^2 + 2*x + 5", "0"), "[-1 - 2*I, -1 + 2*I]");
        assert_eq!(solve_text("x^2 + 1", "0"), "[-I, I]");
    }

    #[test]
    fn test_repeated_root_listed_once() {
        assert_eq!(solve_text("(x - 1)^2", "0"), "[1]");
    }

    #[test]
    fn test_degenerate_equations() {
        assert_eq!(
            solve_equation(&parse("x + 1").unwrap(), &parse("x + 1").unwrap()).unwrap(),
            SolutionSet::AllValues
        );
        assert!(solve_equation(&parse("x").unwrap(), &parse("x + 1").unwrap())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rational_equation() {
        assert_eq!(solve_text("1/x", "2"), "[1/2]");
        assert_eq!(solve_text("(x^2 - 1)/(x - 1)", "0"), "[-1]");
    }

    #[test]
    fn test_cubic_with_irrational_roots() {
        // x^3 - 2 has a single real root, the cube root of 2
        assert_eq!(solve_text("x^3", "2"), "[1.259921]");
    }

    #[test]
    fn test_factor_quadratic() {
        assert_eq!(factor_text("x^2 + 5x + 6"), "(x + 2)(x + 3)");
        assert_eq!(factor_text("x^2 - 2x - 3"), "(x - 3)(x + 1)");
    }

    #[test]
    fn test_factor_content_and_multiplicity() {
        assert_eq!(factor_text("2x^2 - 2"), "2(x - 1)(x + 1)");
        assert_eq!(factor_text("-x^2 + 2x + 3"), "-(x - 3)(x + 1)");
        assert_eq!(factor_text("x^2 + 2x + 1"), "(x + 1)^2");
        assert_eq!(factor_text("x^3 + x^2"), "x^2(x + 1)");
        assert_eq!(factor_text("x^2/2 + x/2"), "x(x + 1)/2");
        assert_eq!(factor_text("6x^2 + 5x + 1"), "(3x + 1)(2x + 1)");
    }

    #[test]
    fn test_factor_irreducible() {
        assert_eq!(factor_text("x^2 + 1"), "x^2 + 1");
        assert_eq!(factor_text("x^3 - x^2 + 2x - 2"), "(x - 1)(x^2 + 2)");
    }

    #[test]
    fn test_root_search_survives_overflowing_candidates() {
        // after x = 10 the degree-8 residual overflows at the larger divisors
        assert_eq!(solve_text("x^9", "1000000000"), "[10]");
        assert!(factor_text("x^9 - 1000000000").starts_with("(x - 10)(x^8 + 10x^7 + 100x^6"));
    }

    #[test]
    fn test_root_bounds_contain_roots() {
        let poly = Polynomial::from_integers(&[-6, 1, 1]);
        let (lower, upper) = root_bounds(&poly);
        assert!(lower <= 2.0 && 3.0 <= upper);
        assert!(upper < 8.0);
    }

    #[test]
    fn test_large_coefficients_stay_exact() {
        // many divisor pairs, but both roots are complex
        let roots = solve_text("735134400*x^2 + x + 735134400", "0");
        assert!(roots.contains("*I"));
        assert!(roots.starts_with("[-1/1470268800 - "));

        let scaled = solve_text("963761198400*x^2 + x + 963761198400", "0");
        assert!(scaled.contains("*I"));
    }

    #[test]
    fn test_expand_and_differentiate() {
        assert_eq!(expand(&parse("(x+3)(x-2)").unwrap()).unwrap(), "x^2 + x - 6");
        assert_eq!(differentiate(&parse("x^3 + 2x").unwrap()).unwrap(), "3x^2 + 2");
        assert!(differentiate(&parse("y^2").unwrap()).is_err());
    }
}
