//! Named report registry.
//!
//! Report kinds are a closed enumeration; named reports are loaded from an
//! optional TOML file at startup and passed into the report command as an
//! explicit value - there is no process-wide registry.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A report kind with its parameters, matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportKind {
    /// Single-question frequency counts
    Frequency {
        question: i64,
        /// Split multi-select answers on `;` before counting
        #[serde(default)]
        split: bool,
        /// Column label for the value axis
        #[serde(default = "default_key")]
        key: String,
    },
    /// Anchor question cross-tabulated against breakdown questions
    Crosstab {
        anchor: i64,
        breakdowns: Vec<i64>,
    },
}

fn default_key() -> String {
    "Value".to_string()
}

/// A named report definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub name: String,
    pub title: String,
    #[serde(flatten)]
    pub kind: ReportKind,
}

/// On-disk shape of the registry file.
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "report")]
    reports: Vec<ReportSpec>,
}

/// The set of named reports available to `report list` / `report run`.
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    specs: Vec<ReportSpec>,
}

impl ReportRegistry {
    pub fn from_specs(specs: Vec<ReportSpec>) -> Self {
        Self { specs }
    }

    /// Load the registry from a TOML file. A missing file yields an empty
    /// registry; a malformed file is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report registry: {}", path.display()))?;
        let file: RegistryFile = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse report registry: {}", path.display()))?;
        Ok(Self::from_specs(file.reports))
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ReportSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ReportSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Report names, for the listing operation.
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_parses_both_kinds() {
        let raw = r#"
            [[report]]
            name = "tools"
            title = "Tools Used"
            kind = "frequency"
            question = 27
            split = true
            key = "Tool"

            [[report]]
            name = "os_wrapper"
            title = "OS and Wrapper"
            kind = "crosstab"
            anchor = 4
            breakdowns = [7]
        "#;
        let file: RegistryFile = toml::from_str(raw).unwrap();
        let registry = ReportRegistry::from_specs(file.reports);

        assert_eq!(registry.names(), vec!["tools", "os_wrapper"]);
        match &registry.get("tools").unwrap().kind {
            ReportKind::Frequency { question, split, key } => {
                assert_eq!(*question, 27);
                assert!(*split);
                assert_eq!(key, "Tool");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        match &registry.get("os_wrapper").unwrap().kind {
            ReportKind::Crosstab { anchor, breakdowns } => {
                assert_eq!(*anchor, 4);
                assert_eq!(breakdowns, &[7]);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_frequency_defaults() {
        let raw = r#"
            [[report]]
            name = "os"
            title = "OS Preference"
            kind = "frequency"
            question = 4
        "#;
        let file: RegistryFile = toml::from_str(raw).unwrap();
        match &file.reports[0].kind {
            ReportKind::Frequency { split, key, .. } => {
                assert!(!*split);
                assert_eq!(key, "Value");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let registry = ReportRegistry::load(Path::new("/nonexistent/reports.toml")).unwrap();
        assert!(registry.is_empty());
    }
}
