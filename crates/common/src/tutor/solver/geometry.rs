//! Closed-form geometry formulas over measurements found in the text

use super::{format_float, SolveFailure, SolveOutcome};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::f64::consts::PI;

/// `<label> ... <number>[unit]`, with at most a short run of non-digits between
fn measure_pattern(label: &str) -> Regex {
    Regex::new(&format!(
        r"{}\D{{0,24}}?(\d+(?:\.\d+)?)\s*(?:(mm|cm|km|ft|m)\b)?",
        label
    ))
    .expect("static pattern")
}

static BASE: Lazy<Regex> = Lazy::new(|| measure_pattern("base"));
static HEIGHT: Lazy<Regex> = Lazy::new(|| measure_pattern("height"));
static LENGTH: Lazy<Regex> = Lazy::new(|| measure_pattern("length"));
static WIDTH: Lazy<Regex> = Lazy::new(|| measure_pattern("width"));
static RADIUS: Lazy<Regex> = Lazy::new(|| measure_pattern("radius"));
static SIDE: Lazy<Regex> = Lazy::new(|| measure_pattern("side"));

#[derive(Debug, Clone, PartialEq)]
struct Measure {
    value: f64,
    unit: Option<String>,
}

fn measure(pattern: &Regex, text: &str) -> Option<Measure> {
    let captures = pattern.captures(text)?;
    let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = captures.get(2).map(|m| m.as_str().to_string());
    Some(Measure { value, unit })
}

/// `"10.0 cm²"`, or just the number when no unit was given
fn with_unit(value: f64, unit: Option<&str>, power: &str) -> String {
    match unit {
        Some(unit) => format!("{} {}{}", format_float(value), unit, power),
        None => format_float(value),
    }
}

fn first_unit<'a>(measures: &'a [&Measure]) -> Option<&'a str> {
    measures.iter().find_map(|m| m.unit.as_deref())
}

pub(super) fn compute(raw_text: &str) -> SolveOutcome {
    let text = raw_text.to_lowercase();
    let has = |words: &[&str]| words.iter().all(|w| text.contains(w));

    if has(&["triangle", "area"]) {
        if let (Some(base), Some(height)) = (measure(&BASE, &text), measure(&HEIGHT, &text)) {
            let area = 0.5 * base.value * height.value;
            return Ok(format!("Area = {}", with_unit(area, first_unit(&[&base, &height]), "²")));
        }
    }

    if has(&["rectangle", "area"]) {
        if let (Some(length), Some(width)) = (measure(&LENGTH, &text), measure(&WIDTH, &text)) {
            let area = length.value * width.value;
            return Ok(format!("Area = {}", with_unit(area, first_unit(&[&length, &width]), "²")));
        }
    }

    if text.contains("circle") {
        if let Some(radius) = measure(&RADIUS, &text) {
            let unit = radius.unit.as_deref();
            if text.contains("area") {
                let area = PI * radius.value * radius.value;
                return Ok(format!("Area = {}", with_unit(area, unit, "²")));
            }
            if text.contains("circumference") || text.contains("perimeter") {
                let circumference = 2.0 * PI * radius.value;
                return Ok(format!("Circumference = {}", with_unit(circumference, unit, "")));
            }
        }
    }

    if has(&["sphere", "volume"]) {
        if let Some(radius) = measure(&RADIUS, &text) {
            let volume = 4.0 / 3.0 * PI * radius.value.powi(3);
            return Ok(format!("Volume = {}", with_unit(volume, radius.unit.as_deref(), "³")));
        }
    }

    if has(&["cube", "volume"]) {
        if let Some(side) = measure(&SIDE, &text) {
            let volume = side.value.powi(3);
            return Ok(format!("Volume = {}", with_unit(volume, side.unit.as_deref(), "³")));
        }
    }

    Err(SolveFailure::NoPattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(text: &str) -> String {
        compute(text).unwrap()
    }

    #[test]
    fn test_triangle_area() {
        assert_eq!(area("base 4cm height 5cm triangle area"), "Area = 10.0 cm²");
        assert_eq!(
            area("What is the area of a triangle with a base of 3 m and a height of 4 m?"),
            "Area = 6.0 m²"
        );
        assert_eq!(area("triangle area, base 2.5 height 2"), "Area = 2.5");
    }

    #[test]
    fn test_rectangle_area() {
        assert_eq!(area("Area of a rectangle with length 5cm and width 3cm"), "Area = 15.0 cm²");
    }

    #[test]
    fn test_circle() {
        assert_eq!(
            area("Find the circumference of a circle with radius 3cm"),
            "Circumference = 18.84955592153876 cm"
        );
        assert_eq!(
            area("area of a circle of radius 1"),
            format!("Area = {:?}", PI)
        );
    }

    #[test]
    fn test_volumes() {
        assert_eq!(area("volume of a cube with side 2cm"), "Volume = 8.0 cm³");
        let sphere = area("volume of a sphere with radius 3");
        assert!(sphere.starts_with("Volume = 113.09"));
    }

    #[test]
    fn test_unit_does_not_swallow_words() {
        let measured = measure(&RADIUS, "radius 5 meters").unwrap();
        assert_eq!(measured.value, 5.0);
        assert_eq!(measured.unit, None);
    }

    #[test]
    fn test_unrecognized_shape() {
        assert!(matches!(compute("area of a hexagon"), Err(SolveFailure::NoPattern)));
        assert!(matches!(compute("triangle area with base 4"), Err(SolveFailure::NoPattern)));
        assert!(compute("").is_err());
    }
}
