//! Models for documents after text and parameter extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Whether a PDF carries a text layer or needs OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Scanned,
    Digital,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanned => "Scanned",
            Self::Digital => "Digital",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Poppler text layer (pdftotext).
    PdfToText,
    /// Tesseract OCR of rendered pages.
    TesseractOcr,
    /// Remote layout analysis (Azure Document Intelligence).
    LayoutService,
}

/// A table recovered from a document, as rows of cell strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub table_id: String,
    pub data: Vec<Vec<String>>,
}

impl TableData {
    /// Flatten the table into a single searchable string.
    pub fn to_text(&self) -> String {
        self.data
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Evidence collected for one quality parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterData {
    /// Text passages around keyword hits.
    #[serde(default, alias = "contexts")]
    pub sections: Vec<String>,
    /// Stringified tables mentioning the parameter.
    #[serde(default, deserialize_with = "deserialize_stringified")]
    pub raw_values: Vec<String>,
    /// Numeric readings with units (e.g. `"17.2 %"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl ParameterData {
    /// All evidence joined into one passage.
    pub fn combined_text(&self) -> String {
        self.sections
            .iter()
            .chain(self.raw_values.iter())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Accept strings or arbitrary JSON (e.g. nested table arrays) and keep text.
fn deserialize_stringified<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// Output of the document processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Lines relevant to at least one parameter.
    pub text: String,
    pub tables: Vec<TableData>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterData>,
    pub doc_type: DocumentType,
    pub method: ExtractionMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_data_accepts_contexts_and_tables() {
        let json = r#"{
            "contexts": ["moisture 17.2 %"],
            "raw_values": [[["Moisture", "17.2 %"]], "plain"]
        }"#;
        let data: ParameterData = serde_json::from_str(json).unwrap();
        assert_eq!(data.sections, vec!["moisture 17.2 %"]);
        assert_eq!(data.raw_values.len(), 2);
        assert_eq!(data.raw_values[0], r#"[["Moisture","17.2 %"]]"#);
        assert_eq!(data.raw_values[1], "plain");
    }

    #[test]
    fn test_combined_text() {
        let data = ParameterData {
            sections: vec!["a".to_string(), "b".to_string()],
            raw_values: vec!["c".to_string()],
            values: Vec::new(),
        };
        assert_eq!(data.combined_text(), "a b c");
    }

    #[test]
    fn test_table_to_text() {
        let table = TableData {
            table_id: "table1".to_string(),
            data: vec![
                vec!["HMF".to_string(), "12 mg/kg".to_string()],
                vec!["Sucrose".to_string(), "2 g/100g".to_string()],
            ],
        };
        assert_eq!(table.to_text(), "HMF | 12 mg/kg\nSucrose | 2 g/100g");
    }
}
