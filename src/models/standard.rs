//! Quality standard definitions.
//!
//! A standard maps parameter names (e.g. `moisture_content`) to the free-text
//! requirement for that parameter (e.g. `"Not more than 20%"`).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A quality standard loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standard {
    requirements: BTreeMap<String, String>,
}

impl Standard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a standard from a JSON file.
    ///
    /// Non-string requirement values are kept in their JSON text form so a
    /// hand-edited standard with numbers still loads.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Parse a standard from JSON text.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(contents)?;
        let requirements = raw
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Ok(Self { requirements })
    }

    /// Write the standard as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn insert(&mut self, parameter: impl Into<String>, requirement: impl Into<String>) {
        self.requirements.insert(parameter.into(), requirement.into());
    }

    /// Requirement text for a parameter, if defined.
    pub fn requirement(&self, parameter: &str) -> Option<&str> {
        self.requirements.get(parameter).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.requirements
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
