//! Table recovery from layout-preserving text.
//!
//! pdftotext `-layout` and Tesseract both keep columns apart with runs of
//! spaces. A table is a run of at least two consecutive lines that each split
//! into two or more cells on gaps of two or more spaces (or tabs).

use std::sync::LazyLock;

use regex::Regex;

/// Column separator: tabs or two or more spaces.
static CELL_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\t+| {2,}").unwrap());

/// Split one layout line into trimmed, non-empty cells.
pub fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}

/// Detect tables in layout text. Ragged rows are padded with empty cells.
pub fn detect_tables(text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else {
            flush(&mut current, &mut tables);
        }
    }
    flush(&mut current, &mut tables);

    tables
}

fn flush(current: &mut Vec<Vec<String>>, tables: &mut Vec<Vec<Vec<String>>>) {
    if current.len() >= 2 {
        let width = current.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut rows = std::mem::take(current);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        tables.push(rows);
    } else {
        current.clear();
    }
}
