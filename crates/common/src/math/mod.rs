//! Algebra core for the tutoring pipeline
//!
//! A deliberately small computer-algebra layer:
//! - Exact rational arithmetic
//! - Expression parsing with implicit multiplication
//! - Univariate polynomials and rational functions in `x`
//! - Equation solving, factoring, expansion and differentiation

mod expr;
mod parser;
mod poly;
pub(crate) mod rational;
mod solve;

pub use expr::Expr;
pub use parser::parse;
pub use poly::{Polynomial, RationalFunction};
pub use rational::Rational;
pub use solve::{
    differentiate, expand, factor, factor_polynomial, polynomial_roots, solve_equation,
    Factorization, Root, SolutionSet,
};

use thiserror::Error;

/// The single variable every problem is solved for
pub const VARIABLE: char = 'x';

/// Highest polynomial degree the core will build
pub const MAX_DEGREE: usize = 64;

pub type MathResult<T> = std::result::Result<T, MathError>;

/// Failures inside the algebra core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Parse error at {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Degree {degree} exceeds the supported maximum of {max}")]
    DegreeTooLarge { degree: usize, max: usize },

    #[error("Unsupported symbol '{0}', only '{var}' is supported", var = VARIABLE)]
    UnsupportedSymbol(char),

    #[error("Exponent must be an integer constant")]
    NonIntegerExponent,
}
