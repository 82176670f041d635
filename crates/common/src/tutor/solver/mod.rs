//! Solver - category-specific computation
//!
//! `solve` is total: every failure inside a category branch is logged and
//! turned into that category's diagnostic text, so a `ComputedResult` is
//! always produced.

mod geometry;
mod probability;
mod statistics;

use super::classifier::ProblemCategory;
use super::extractor::{normalize, FormalExpression};
use crate::math::{self, Expr, MathError, MathResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Outcome of solving one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ComputedResult {
    /// Definitive answer
    Answer(String),
    /// Placeholder explaining why no answer was computed
    Diagnostic(String),
}

impl ComputedResult {
    pub fn text(&self) -> &str {
        match self {
            ComputedResult::Answer(text) | ComputedResult::Diagnostic(text) => text,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, ComputedResult::Diagnostic(_))
    }
}

impl fmt::Display for ComputedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Why a branch produced no answer; never leaves this module
#[derive(Error, Debug)]
enum SolveFailure {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error("no expression was extracted")]
    MissingExpression,

    #[error("an equality cannot be used here")]
    UnexpectedEquality,

    #[error("no known pattern matched")]
    NoPattern,

    #[error("no numbers found")]
    NoNumbers,

    #[error("category is not supported")]
    Unsupported,
}

type SolveOutcome = std::result::Result<String, SolveFailure>;

/// Diagnostic text for a category
pub fn diagnostic(category: ProblemCategory) -> &'static str {
    match category {
        ProblemCategory::Equation => "Could not compute equation.",
        ProblemCategory::Factorization => "Could not compute factorization.",
        ProblemCategory::Expansion => "Could not compute expansion.",
        ProblemCategory::Calculus => "Could not compute derivative.",
        ProblemCategory::Geometry => "Could not compute geometry.",
        ProblemCategory::Statistics => "Could not compute statistics.",
        ProblemCategory::Probability => "Could not compute probability.",
        ProblemCategory::LinearAlgebra => "Linear algebra problems are not supported yet.",
        ProblemCategory::Sequences => "Sequence problems are not supported yet.",
        ProblemCategory::Unknown => "I am not sure how to solve this.",
    }
}

/// Compute the answer for a classified question
pub fn solve(
    category: ProblemCategory,
    expression: Option<&FormalExpression>,
    raw_text: &str,
) -> ComputedResult {
    let outcome = match category {
        ProblemCategory::Equation => solve_equation(expression, raw_text),
        ProblemCategory::Factorization => transform(expression, math::factor),
        ProblemCategory::Expansion => transform(expression, math::expand),
        ProblemCategory::Calculus => transform(expression, math::differentiate),
        ProblemCategory::Geometry => geometry::compute(raw_text),
        ProblemCategory::Statistics => statistics::compute(raw_text),
        ProblemCategory::Probability => probability::compute(raw_text),
        ProblemCategory::LinearAlgebra | ProblemCategory::Sequences | ProblemCategory::Unknown => {
            Err(SolveFailure::Unsupported)
        }
    };

    match outcome {
        Ok(answer) => ComputedResult::Answer(answer),
        Err(reason) => {
            debug!(category = %category, reason = %reason, "Solver fell back to diagnostic");
            ComputedResult::Diagnostic(diagnostic(category).to_string())
        }
    }
}

fn solve_equation(expression: Option<&FormalExpression>, raw_text: &str) -> SolveOutcome {
    let (lhs, rhs) = match expression {
        Some(FormalExpression::Equality { lhs, rhs }) => (lhs.clone(), rhs.clone()),
        other => match raw_equality(raw_text) {
            Some(sides) => sides,
            None => {
                let expr = other
                    .and_then(FormalExpression::expr)
                    .ok_or(SolveFailure::MissingExpression)?;
                (expr.clone(), Expr::integer(0))
            }
        },
    };

    let solutions = math::solve_equation(&lhs, &rhs)?;
    if solutions.is_empty() {
        Ok("No solution found.".to_string())
    } else {
        Ok(format!("x = {}", solutions))
    }
}

/// Both sides of a raw text holding exactly one `=`, when each side parses
fn raw_equality(raw_text: &str) -> Option<(Expr, Expr)> {
    if raw_text.matches('=').count() != 1 {
        return None;
    }
    let (lhs, rhs) = raw_text.split_once('=')?;
    let lhs = math::parse(normalize(lhs.trim()).as_str()).ok()?;
    let rhs = math::parse(normalize(rhs.trim()).as_str()).ok()?;
    Some((lhs, rhs))
}

fn transform(
    expression: Option<&FormalExpression>,
    operation: fn(&Expr) -> MathResult<String>,
) -> SolveOutcome {
    match expression {
        None => Err(SolveFailure::MissingExpression),
        Some(FormalExpression::Equality { .. }) => Err(SolveFailure::UnexpectedEquality),
        Some(FormalExpression::Polynomial(expr)) | Some(FormalExpression::Expression(expr)) => {
            Ok(operation(expr)?)
        }
    }
}

/// Render a float the way a shortest round-trip repr does (`10.0`, `2.5`)
fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::{classify, ExpressionExtractor};

    fn answer(question: &str) -> ComputedResult {
        let expression = ExpressionExtractor::default().extract(question);
        solve(classify(question), expression.as_ref(), question)
    }

    fn text(question: &str) -> String {
        answer(question).text().to_string()
    }

    #[test]
    fn test_linear_equation() {
        assert_eq!(text("Solve 2x + 3 = 13"), "x = [5]");
        assert_eq!(text("Solve for x: 5x - 7 = 3x + 4"), "x = [11/2]");
    }

    #[test]
    fn test_quadratic_equation() {
        assert_eq!(text("solve x^2 = 4"), "x = [-2, 2]");
        assert_eq!(text("solve x^2 + 5x + 6 = 0"), "x = [-3, -2]");
    }

    #[test]
    fn test_equation_without_equals_sign() {
        assert_eq!(text("solve x^2 - 9"), "x = [-3, 3]");
    }

    #[test]
    fn test_degenerate_equations() {
        assert_eq!(text("solve x + 1 = x + 2"), "No solution found.");
        assert_eq!(text("solve 2x = 2x"), "x = all real numbers");
    }

    #[test]
    fn test_equation_diagnostic() {
        let result = answer("solve this please");
        assert!(result.is_diagnostic());
        assert_eq!(result.text(), "Could not compute equation.");
        assert_eq!(text("solve x/0 = 1"), "Could not compute equation.");
    }

    #[test]
    fn test_factorization() {
        assert_eq!(text("Factorize x^2 + 5x + 6"), "(x + 2)(x + 3)");
        assert_eq!(text("factorise 2x^2 - 2"), "2(x - 1)(x + 1)");
        assert_eq!(text("factorize 2x + 3 = 5"), "Could not compute factorization.");
        assert_eq!(text("factorize it"), "Could not compute factorization.");
    }

    #[test]
    fn test_high_degree_with_large_constant() {
        assert_eq!(text("solve x^9 = 1000000000"), "x = [10]");
        assert!(text("factorize x^9 - 1000000000").starts_with("(x - 10)(x^8"));
        assert!(!answer("factorize x^9 - 1000000000").is_diagnostic());
    }

    #[test]
    fn test_expansion_and_derivative() {
        assert_eq!(text("Expand (x+3)(x-2)"), "x^2 + x - 6");
        assert_eq!(text("Find the derivative of x^3 + 2x"), "3x^2 + 2");
        assert_eq!(text("differentiate y^2"), "Could not compute derivative.");
    }

    #[test]
    fn test_placeholder_categories() {
        assert_eq!(
            text("Find the determinant of the matrix"),
            "Linear algebra problems are not supported yet."
        );
        assert_eq!(
            text("What comes next in the sequence 2, 4, 6"),
            "Sequence problems are not supported yet."
        );
        let unknown = answer("Tell me a joke");
        assert!(unknown.is_diagnostic());
        assert_eq!(unknown.text(), "I am not sure how to solve this.");
    }

    #[test]
    fn test_idempotent() {
        let question = "Factorize x^2 - 5x + 6";
        assert_eq!(answer(question), answer(question));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(10.0), "10.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
    }
}
