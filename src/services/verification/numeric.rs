//! Numeric readings and requirement limits.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ExtractedValue, RequirementType};
use crate::utils::context_window;

const VALUE_CONTEXT_RADIUS: usize = 50;

/// Applied in order; a number may be reported once per matching pattern.
static VALUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+\.?\d*)\s*(%|percent)",
        r"(?i)(\d+\.?\d*)\s*(mg/kg|ppm)",
        r"(?i)(\d+\.?\d*)\s*(schade|units)",
        r"(?i)(\d+\.?\d*)\s*(g/100g|%)",
        r"(?i)(\d+\.?\d*)\s*(meq/kg)",
        r"(?i)(\d+\.?\d*)\s*(ms/cm)",
        r"(?i)(\d+\.?\d*)\s*(g/100g|%)",
        r"(?i)(\d+\.?\d*)\s?([a-z]+/[a-z]+|[a-z]+)?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Every number-with-unit reading in `text`, pattern by pattern.
pub fn extract_numeric_values(text: &str) -> Vec<ExtractedValue> {
    let mut values = Vec::new();
    for pattern in VALUE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            values.push(ExtractedValue {
                value: caps[1].to_string(),
                unit: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                context: context_window(text, whole.start(), whole.end(), VALUE_CONTEXT_RADIUS)
                    .to_string(),
            });
        }
    }
    values
}

/// Bare numbers in order of appearance.
pub fn numbers(text: &str) -> Vec<&str> {
    NUMBER.find_iter(text).map(|m| m.as_str()).collect()
}

/// Kind of limit a requirement text expresses.
pub fn requirement_type(requirement: &str) -> RequirementType {
    let lower = requirement.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["maximum", "max", "not more than"]) || requirement.contains('≤') {
        RequirementType::Maximum
    } else if has(&["minimum", "min", "not less than"]) || requirement.contains('≥') {
        RequirementType::Minimum
    } else if has(&["between", "range"]) {
        RequirementType::Range
    } else {
        RequirementType::Unknown
    }
}

/// First reading of a requirement text (`"20 %"`) and its kind of limit.
///
/// `None` when the requirement carries no number.
pub fn find_standard_value(requirement: &str) -> Option<(String, RequirementType)> {
    let first = extract_numeric_values(requirement).into_iter().next()?;
    let value = if first.unit.is_empty() {
        first.value
    } else {
        format!("{} {}", first.value, first.unit)
    };
    Some((value, requirement_type(requirement)))
}
