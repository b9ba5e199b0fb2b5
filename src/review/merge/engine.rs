use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, instrument};

use crate::review::merge::aggregate::aggregate;
use crate::review::merge::build::build_table;
use crate::review::merge::config::MergeConfig;
use crate::review::merge::error::{MergeError, Result};
use crate::review::merge::io::{excel_read, excel_write};
use crate::review::merge::model::{OutputTable, RowSet};
use crate::review::merge::validate::validate_paths;

/// Entry point used by front ends. The engine only holds its configuration,
/// so one instance can run any number of independent merges.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Rejects an unusable input set before anything is merged.
    pub fn validate(&self, paths: &[PathBuf]) -> Result<()> {
        validate_paths(paths, &self.config.columns)
    }

    /// Loads every workbook and merges them into the summary table. The first
    /// workbook decides which items appear in the summary.
    #[instrument(level = "info", skip_all, fields(file_count = paths.len()))]
    pub fn process(&self, paths: &[PathBuf]) -> Result<OutputTable> {
        let row_sets = paths
            .iter()
            .map(|path| excel_read::read_row_set(path))
            .collect::<Result<Vec<RowSet>>>()?;
        info!(workbooks = row_sets.len(), "loaded review workbooks");

        self.merge(&row_sets)
    }

    /// Merges already loaded row sets. `row_sets[0]` is the base workbook.
    pub fn merge(&self, row_sets: &[RowSet]) -> Result<OutputTable> {
        let first = row_sets.first().ok_or(MergeError::NoInputFiles)?;
        let (index, reviewers) = aggregate(row_sets, &self.config.columns)?;
        build_table(first, &reviewers, &index, &self.config)
    }

    /// Writes the summary table to `destination`.
    #[instrument(level = "info", skip_all, fields(destination = %destination.display()))]
    pub fn save(&self, table: &OutputTable, destination: &Path) -> Result<()> {
        excel_write::write_table(destination, table, Some(&self.config.columns.opinion))?;
        info!(rows = table.rows.len(), "summary saved");
        Ok(())
    }

    /// Validates, merges and saves in one go.
    pub fn run(&self, paths: &[PathBuf], destination: &Path) -> Result<OutputTable> {
        self.validate(paths)?;
        let table = self.process(paths)?;
        self.save(&table, destination)?;
        Ok(table)
    }

    /// File name suggested for a summary created at `timestamp`, e.g.
    /// `review_summary_20240131_093000.xlsx`.
    pub fn default_output_name(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "{}_{}.xlsx",
            self.config.output_prefix,
            timestamp.format("%Y%m%d_%H%M%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::review::merge::error::ErrorKind;

    #[test]
    fn default_output_name_uses_prefix_and_timestamp() {
        let engine = MergeEngine::default();
        let timestamp = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|date| date.and_hms_opt(9, 30, 0))
            .expect("valid timestamp");

        assert_eq!(
            engine.default_output_name(timestamp),
            "review_summary_20240131_093000.xlsx"
        );
    }

    #[test]
    fn merging_nothing_is_rejected() {
        let error = MergeEngine::default().merge(&[]).unwrap_err();
        assert!(matches!(error, MergeError::NoInputFiles));
    }

    #[test]
    fn short_rows_fail_the_merge_instead_of_panicking() {
        let columns = ["item_code", "reviewer", "selection", "opinion"]
            .into_iter()
            .map(String::from)
            .collect();
        let ragged = RowSet::new(
            "a.xlsx",
            columns,
            vec![vec![Some("1".into()), Some("kim".into())]],
        );

        let error = MergeEngine::default().merge(&[ragged]).unwrap_err();

        assert!(matches!(
            error,
            MergeError::RaggedRow { row: 2, expected: 4, found: 2, .. }
        ));
        assert_eq!(error.kind(), ErrorKind::DataProcessing);
    }
}
