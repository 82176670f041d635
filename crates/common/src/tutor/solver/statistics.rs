//! Descriptive statistics over every number in the question

use super::{format_float, SolveFailure, SolveOutcome};
use once_cell::sync::Lazy;
use regex_lite::Regex;

// A minus only counts as a sign at the start of a token, so "1-5" stays positive
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d+(?:\.\d+)?)").expect("static pattern")
});

pub(super) fn numbers(text: &str) -> Vec<f64> {
    NUMBER
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .collect()
}

pub(super) fn compute(raw_text: &str) -> SolveOutcome {
    let text = raw_text.to_lowercase();
    let values = numbers(&text);
    if values.is_empty() {
        return Err(SolveFailure::NoNumbers);
    }

    if text.contains("mean") {
        Ok(format!("Mean = {}", format_float(mean(&values))))
    } else if text.contains("median") {
        Ok(format!("Median = {}", format_float(median(&values))))
    } else if text.contains("mode") {
        Ok(format!("Mode = {}", format_value(mode(&values))))
    } else {
        Err(SolveFailure::NoPattern)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent value; ties go to the smallest
fn mode(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best = (sorted[0], 0usize);
    let mut i = 0;
    while i < sorted.len() {
        let run = sorted[i..].iter().take_while(|v| **v == sorted[i]).count();
        if run > best.1 {
            best = (sorted[i], run);
        }
        i += run;
    }
    best.0
}

/// Integral values print without a fractional part
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format_float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_scan() {
        assert_eq!(numbers("mean of 1, 2.5 and -3"), vec![1.0, 2.5, -3.0]);
        assert_eq!(numbers("values 1-5"), vec![1.0, 5.0]);
        assert!(numbers("no digits").is_empty());
    }

    #[test]
    fn test_mean() {
        assert_eq!(compute("Find the mean of 1, 2, 3, 4").unwrap(), "Mean = 2.5");
        assert_eq!(compute("mean of 2, 4, 6").unwrap(), "Mean = 4.0");
    }

    #[test]
    fn test_median() {
        assert_eq!(compute("median of 3, 1, 2").unwrap(), "Median = 2.0");
        assert_eq!(compute("median of 4, 1, 3, 2").unwrap(), "Median = 2.5");
    }

    #[test]
    fn test_mode() {
        assert_eq!(compute("mode of 1, 2, 2, 3").unwrap(), "Mode = 2");
        assert_eq!(compute("mode of 3, 3, 1, 1, 2").unwrap(), "Mode = 1");
        assert_eq!(compute("mode of 1.5, 1.5, 2").unwrap(), "Mode = 1.5");
    }

    #[test]
    fn test_keyword_order() {
        assert_eq!(compute("mean and median of 1, 2, 6").unwrap(), "Mean = 3.0");
    }

    #[test]
    fn test_diagnostics() {
        assert!(matches!(compute("mean of nothing"), Err(SolveFailure::NoNumbers)));
        assert!(matches!(compute("spread of 1, 2"), Err(SolveFailure::NoPattern)));
    }
}
