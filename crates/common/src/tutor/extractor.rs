//! Expression Extractor - pulls a formal expression out of free text
//!
//! The accepted character set is:
//! - ASCII digits and `.`
//! - the operators `+ - * / ^ =` and parentheses
//! - whitespace
//! - ASCII letters that stand alone (not next to another letter)
//!
//! Words of two or more letters (`solve`, `cm`, `factorize`) act as
//! separators, so "Solve for x: 2x + 3 = 13" yields the run `2x + 3 = 13`.
//! A run only counts when it holds a digit or the variable `x`; the longest
//! run wins and ties go to the earliest.

use crate::config::ExtractorConfig;
use crate::math::{self, Expr, MathResult, RationalFunction, VARIABLE};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;
use tracing::debug;

static IMPLICIT_PRODUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)([a-zA-Z])").expect("static pattern"));

/// Formal object recovered from a question
#[derive(Debug, Clone, PartialEq)]
pub enum FormalExpression {
    /// Two expressions asserted equal
    Equality { lhs: Expr, rhs: Expr },

    /// Polynomial in the tutoring variable
    Polynomial(Expr),

    /// Parsed, but not a polynomial (other symbols, division by `x`, ...)
    Expression(Expr),
}

impl FormalExpression {
    /// The expression, unless this is an equality
    pub fn expr(&self) -> Option<&Expr> {
        match self {
            FormalExpression::Equality { .. } => None,
            FormalExpression::Polynomial(e) | FormalExpression::Expression(e) => Some(e),
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, FormalExpression::Equality { .. })
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            FormalExpression::Equality { .. } => ExpressionKind::Equality,
            FormalExpression::Polynomial(_) => ExpressionKind::Polynomial,
            FormalExpression::Expression(_) => ExpressionKind::Expression,
        }
    }
}

impl fmt::Display for FormalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormalExpression::Equality { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            FormalExpression::Polynomial(e) | FormalExpression::Expression(e) => write!(f, "{}", e),
        }
    }
}

/// Tag of a `FormalExpression`, used as a log field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Equality,
    Polynomial,
    Expression,
}

impl ExpressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionKind::Equality => "equality",
            ExpressionKind::Polynomial => "polynomial",
            ExpressionKind::Expression => "expression",
        }
    }
}

/// Turns raw question text into a `FormalExpression`
#[derive(Debug, Clone, Default)]
pub struct ExpressionExtractor {
    config: ExtractorConfig,
}

impl ExpressionExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract the formal expression, or `None` when the text holds none
    pub fn extract(&self, text: &str) -> Option<FormalExpression> {
        let candidate = longest_math_run(text)?;
        let normalized = normalize(candidate);

        let extracted = match parse_normalized(&normalized) {
            Ok(extracted) => extracted,
            Err(e) => {
                debug!(candidate = %normalized, error = %e, "Discarding unparseable math run");
                return None;
            }
        };

        if self.config.require_polynomial && matches!(extracted, FormalExpression::Expression(_)) {
            debug!(expression = %extracted, "Discarding non-polynomial expression");
            return None;
        }

        Some(extracted)
    }
}

/// Rewrite `^` as `**` and `2x` as `2*x`
pub fn normalize(candidate: &str) -> String {
    let powered = candidate.replace('^', "**");
    IMPLICIT_PRODUCT.replace_all(&powered, "${1}*${2}").into_owned()
}

fn parse_normalized(normalized: &str) -> MathResult<FormalExpression> {
    if normalized.matches('=').count() == 1 {
        if let Some((lhs, rhs)) = normalized.split_once('=') {
            return Ok(FormalExpression::Equality {
                lhs: math::parse(lhs.trim())?,
                rhs: math::parse(rhs.trim())?,
            });
        }
    }

    let expr = math::parse(normalized.trim())?;
    let is_polynomial = RationalFunction::from_expr(&expr)
        .map(|f| f.is_polynomial())
        .unwrap_or(false);

    Ok(if is_polynomial {
        FormalExpression::Polynomial(expr)
    } else {
        FormalExpression::Expression(expr)
    })
}

fn is_math_char(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c.is_ascii_digit() || c.is_whitespace() || ".+-*/()^=".contains(c) {
        return true;
    }
    if c.is_ascii_alphabetic() {
        let before = i > 0 && chars[i - 1].is_ascii_alphabetic();
        let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic());
        return !before && !after;
    }
    false
}

fn qualifies(run: &str) -> bool {
    run.chars().any(|c| c.is_ascii_digit() || c == VARIABLE)
}

/// Longest trimmed run of math characters holding a digit or the variable
pub fn longest_math_run(text: &str) -> Option<&str> {
    let chars: Vec<char> = text.chars().collect();
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut best: Option<&str> = None;
    let mut start: Option<usize> = None;

    for i in 0..=chars.len() {
        let inside = i < chars.len() && is_math_char(&chars, i);
        match (inside, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                let run = text[offsets[s]..offsets[i]].trim();
                if qualifies(run) && best.map_or(true, |b| run.len() > b.len()) {
                    best = Some(run);
                }
                start = None;
            }
            _ => {}
        }
    }

    best
}
