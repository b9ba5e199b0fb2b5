use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::review::merge::error::{MergeError, Result};

/// Prefix prepended to every consolidated opinion line.
pub const DEFAULT_MARKER: &str = "→";
/// Worksheet name used for the summary workbook.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
/// File name prefix used when the caller does not pick an output path.
pub const DEFAULT_OUTPUT_PREFIX: &str = "review_summary";

/// Header names of the four columns every review workbook must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub item_code: String,
    pub reviewer: String,
    pub selection: String,
    pub opinion: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            item_code: "item_code".to_string(),
            reviewer: "reviewer".to_string(),
            selection: "selection".to_string(),
            opinion: "opinion".to_string(),
        }
    }
}

impl ColumnNames {
    /// Required columns in the order they are reported to the user.
    pub fn required(&self) -> [&str; 4] {
        [
            self.item_code.as_str(),
            self.reviewer.as_str(),
            self.selection.as_str(),
            self.opinion.as_str(),
        ]
    }

    /// Whether `name` is one of the per-reviewer columns stripped from the
    /// fixed part of the summary.
    pub fn is_review_column(&self, name: &str) -> bool {
        name == self.reviewer || name == self.selection || name == self.opinion
    }
}

/// Settings that shape a merge. A merge never mutates its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub columns: ColumnNames,
    pub marker: String,
    pub sheet_name: String,
    pub output_prefix: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            marker: DEFAULT_MARKER.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl MergeConfig {
    /// Loads a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|source| MergeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: MergeConfig = serde_json::from_str(
            r#"{"marker": "* ", "columns": {"item_code": "Code"}}"#,
        )
        .expect("config parsed");

        assert_eq!(config.marker, "* ");
        assert_eq!(config.columns.item_code, "Code");
        assert_eq!(config.columns.reviewer, "reviewer");
        assert_eq!(config.sheet_name, DEFAULT_SHEET_NAME);
    }

    #[test]
    fn review_columns_exclude_item_code() {
        let columns = ColumnNames::default();
        assert!(columns.is_review_column("opinion"));
        assert!(!columns.is_review_column("item_code"));
    }
}
