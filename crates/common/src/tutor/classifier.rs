//! Question Classifier - assigns each question a problem category
//!
//! Classification is case-insensitive keyword containment. Categories are
//! checked in a fixed priority order and the first hit wins, so
//! "solve and simplify" is an equation problem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem category of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    /// Solve for the unknown
    Equation,
    /// Factor a polynomial
    Factorization,
    /// Expand or simplify
    Expansion,
    /// Differentiate
    Calculus,
    /// Area, volume, circumference
    Geometry,
    /// Mean, median, mode
    Statistics,
    /// Canned probability problems
    Probability,
    /// Recognized but not solved
    LinearAlgebra,
    /// Recognized but not solved
    Sequences,
    /// Nothing matched
    Unknown,
}

impl ProblemCategory {
    /// Every category, in classification priority order
    pub const ALL: [ProblemCategory; 10] = [
        ProblemCategory::Equation,
        ProblemCategory::Factorization,
        ProblemCategory::Expansion,
        ProblemCategory::Calculus,
        ProblemCategory::Geometry,
        ProblemCategory::Statistics,
        ProblemCategory::Probability,
        ProblemCategory::LinearAlgebra,
        ProblemCategory::Sequences,
        ProblemCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCategory::Equation => "equation",
            ProblemCategory::Factorization => "factorization",
            ProblemCategory::Expansion => "expansion",
            ProblemCategory::Calculus => "calculus",
            ProblemCategory::Geometry => "geometry",
            ProblemCategory::Statistics => "statistics",
            ProblemCategory::Probability => "probability",
            ProblemCategory::LinearAlgebra => "linear_algebra",
            ProblemCategory::Sequences => "sequences",
            ProblemCategory::Unknown => "unknown",
        }
    }

    /// Trigger keywords, lowercase
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ProblemCategory::Equation => &["solve"],
            ProblemCategory::Factorization => &["factorize", "factorise"],
            ProblemCategory::Expansion => &["expand", "simplify"],
            ProblemCategory::Calculus => &["differentiate", "derivative"],
            ProblemCategory::Geometry => &["area", "volume", "circumference", "perimeter"],
            ProblemCategory::Statistics => &["mean", "median", "mode"],
            ProblemCategory::Probability => &["probability"],
            ProblemCategory::LinearAlgebra => &["matrix", "determinant"],
            ProblemCategory::Sequences => &["sequence", "series"],
            ProblemCategory::Unknown => &[],
        }
    }
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a question; total, never fails
pub fn classify(text: &str) -> ProblemCategory {
    let lowered = text.to_lowercase();

    ProblemCategory::ALL
        .into_iter()
        .find(|category| {
            category
                .keywords()
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .unwrap_or(ProblemCategory::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_keyword_categories() {
        assert_eq!(classify("Solve 2x + 3 = 13"), ProblemCategory::Equation);
        assert_eq!(classify("Factorize x^2 + 5x + 6"), ProblemCategory::Factorization);
        assert_eq!(classify("factorise x^2 - 1"), ProblemCategory::Factorization);
        assert_eq!(classify("Expand (x+3)(x-2)"), ProblemCategory::Expansion);
        assert_eq!(classify("simplify 2x + 3x"), ProblemCategory::Expansion);
        assert_eq!(classify("Find the derivative of x^3"), ProblemCategory::Calculus);
        assert_eq!(classify("Area of a circle with radius 3"), ProblemCategory::Geometry);
        assert_eq!(classify("Find the median of 1, 2, 3"), ProblemCategory::Statistics);
        assert_eq!(classify("What is the probability of heads?"), ProblemCategory::Probability);
        assert_eq!(classify("Determinant of a 2x2 matrix"), ProblemCategory::LinearAlgebra);
        assert_eq!(classify("Next term of the sequence 1, 4, 9"), ProblemCategory::Sequences);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(classify("solve and simplify"), ProblemCategory::Equation);
        assert_eq!(classify("Solve or factorize x^2 - 4"), ProblemCategory::Equation);
        assert_eq!(classify("factorize, then solve"), ProblemCategory::Equation);
        assert_eq!(classify("expand then differentiate"), ProblemCategory::Expansion);
        assert_eq!(classify("mean probability"), ProblemCategory::Statistics);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("SOLVE X = 2"), ProblemCategory::Equation);
        assert_eq!(classify("DiFfErEnTiAtE x"), ProblemCategory::Calculus);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify(""), ProblemCategory::Unknown);
        assert_eq!(classify("Hello, world!"), ProblemCategory::Unknown);
        assert_eq!(classify("2 + 2"), ProblemCategory::Unknown);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ProblemCategory::LinearAlgebra.to_string(), "linear_algebra");
        let json = serde_json::to_string(&ProblemCategory::Sequences).unwrap();
        assert_eq!(json, "\"sequences\"");
    }
}
