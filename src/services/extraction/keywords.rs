//! Parameter keyword table and keyword-driven filtering.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ParameterData, TableData};
use crate::ocr::DocumentLayout;
use crate::utils::context_window;

/// Quality parameters and the (lowercase) keywords that trigger them.
pub const PARAMETER_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "moisture_content",
        &["moisture", "water content", "humidity", "%"],
    ),
    ("hMF_content", &["hmf", "hydroxymethylfurfural", "mg/kg"]),
    ("diastase_activity", &["diastase", "schade", "enzyme"]),
    ("sucrose_content", &["sucrose", "g/100g"]),
    ("free_acidity", &["acidity", "milliequivalents", "meq/kg"]),
    (
        "electrical_conductivity",
        &["conductivity", "ms/cm", "milli-siemens", "µmhos/cm"],
    ),
    ("insoluble_solids", &["insoluble solids", "sediment"]),
    (
        "glucose_fructose",
        &["glucose", "fructose", "reducing sugars"],
    ),
];

/// Characters of context kept on each side of a keyword hit.
pub const CONTEXT_RADIUS: usize = 100;

static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(%|mg/kg|g/100g|meq/kg|ms/cm)").unwrap()
});

/// Keywords for a parameter name.
pub fn keywords_for(param: &str) -> Option<&'static [&'static str]> {
    PARAMETER_KEYWORDS
        .iter()
        .find(|(name, _)| *name == param)
        .map(|(_, keywords)| *keywords)
}

/// Case-insensitive check for any keyword of `param` in `text`.
pub fn contains_keyword(text: &str, param: &str) -> bool {
    let lower = text.to_lowercase();
    keywords_for(param).is_some_and(|keywords| keywords.iter().any(|k| lower.contains(k)))
}

/// Keep the lines and tables that introduce a parameter not yet seen.
///
/// Scanning stops once every parameter has been found.
pub fn filter_layout(layout: &DocumentLayout) -> (String, Vec<TableData>) {
    let mut found: BTreeSet<&str> = BTreeSet::new();
    let all_found = |found: &BTreeSet<&str>| found.len() == PARAMETER_KEYWORDS.len();

    let mut text = String::new();
    for line in &layout.lines {
        if all_found(&found) {
            break;
        }
        let mut keep = false;
        for (param, _) in PARAMETER_KEYWORDS {
            if !found.contains(param) && contains_keyword(line, param) {
                found.insert(param);
                keep = true;
            }
        }
        if keep {
            text.push_str(line);
            text.push('\n');
        }
    }

    let mut tables = Vec::new();
    for grid in &layout.tables {
        if all_found(&found) {
            break;
        }
        let mut keep = false;
        for cell in grid.iter().flatten() {
            for (param, _) in PARAMETER_KEYWORDS {
                if !found.contains(param) && contains_keyword(cell, param) {
                    found.insert(param);
                    keep = true;
                }
            }
        }
        if keep {
            tables.push(TableData {
                table_id: format!("table{}", tables.len() + 1),
                data: grid.clone(),
            });
        }
    }

    (text, tables)
}

/// `"<number> <unit>"` readings in a passage.
pub fn extract_values(text: &str) -> Vec<String> {
    VALUE_RE
        .captures_iter(text)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
        .collect()
}

/// Collect per-parameter evidence from filtered text and tables.
pub fn extract_parameters(text: &str, tables: &[TableData]) -> BTreeMap<String, ParameterData> {
    let mut params: BTreeMap<String, ParameterData> = BTreeMap::new();
    let lower = text.to_lowercase();

    for (param, keywords) in PARAMETER_KEYWORDS {
        let mut sections = Vec::new();
        for keyword in *keywords {
            for (start, hit) in lower.match_indices(keyword) {
                let end = start + hit.len();
                sections.push((start, context_window(&lower, start, end, CONTEXT_RADIUS)));
            }
        }
        if sections.is_empty() {
            continue;
        }
        // Report hits in document order, as a single alternation would.
        sections.sort_by_key(|(start, _)| *start);
        params.entry(param.to_string()).or_default().sections =
            sections.into_iter().map(|(_, s)| s.to_string()).collect();
    }

    for table in tables {
        let table_text = table.to_text().to_lowercase();
        for (param, keywords) in PARAMETER_KEYWORDS {
            if keywords.iter().any(|k| table_text.contains(k)) {
                let entry = params.entry(param.to_string()).or_default();
                let raw = table.to_text();
                if !entry.raw_values.contains(&raw) {
                    entry.raw_values.push(raw);
                }
            }
        }
    }

    for data in params.values_mut() {
        data.values = data
            .raw_values
            .iter()
            .chain(data.sections.iter())
            .flat_map(|s| extract_values(s))
            .collect();
    }

    params
}
